// GPU tests compare the wgpu backend against the CPU golden master. They return
// early on machines without a usable adapter.

#[cfg(feature = "gpu")]
mod wgpu_tests {
    use compute::{
        ComputeBackend, ComputeError, CpuBackend, GridDims, PassInput, ShaderSource, WgpuBackend,
    };

    fn gpu_or_skip() -> Option<WgpuBackend> {
        match WgpuBackend::try_new() {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                eprintln!("skipping GPU test: {e}");
                None
            }
        }
    }

    // Writes (x, y, 7, ticket) per pixel; tickets come from the lock word.
    const COORD_SHADER: &str = r"
struct Dimensions { width: u32, height: u32 }
@group(0) @binding(0) var<uniform> dims: Dimensions;
@group(0) @binding(1) var<storage, read_write> pixels: array<u32>;
@group(0) @binding(2) var<storage, read_write> sched_lock: atomic<u32>;
override buffer_elements: u32;

@compute @workgroup_size(1, 1, 1)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    if (id.x >= dims.width || id.y >= dims.height) { return; }
    let base = (id.y * dims.width + id.x) * 4u;
    if (base + 4u > buffer_elements) { return; }
    let ticket = atomicAdd(&sched_lock, 1u);
    pixels[base] = id.x;
    pixels[base + 1u] = id.y;
    pixels[base + 2u] = pixels[base + 2u] + 7u;
    pixels[base + 3u] = ticket;
}
";

    fn run_golden_test(input: &PassInput) {
        let Some(gpu) = gpu_or_skip() else { return };
        let cpu = CpuBackend::new();

        let expected = cpu.run_compute_pass(&ShaderSource::Embedded, input).unwrap();
        let actual = gpu.run_compute_pass(&ShaderSource::Embedded, input).unwrap();

        assert_eq!(expected.grid, actual.grid);
        assert_eq!(expected.data, actual.data, "Mismatch between CPU and wgpu output");
    }

    #[test]
    fn test_zeroed_default_grid() {
        run_golden_test(&PassInput::zeroed(GridDims::default()));
    }

    #[test]
    fn test_nonzero_grid_passes_through() {
        let grid = GridDims::new(5, 3).unwrap();
        let data: Vec<u32> = (0..grid.element_count() as u32).map(|i| i * 31 + 1).collect();
        run_golden_test(&PassInput::new(grid, data).unwrap());
    }

    #[test]
    fn test_every_invocation_runs_once() {
        let Some(gpu) = gpu_or_skip() else { return };
        let grid = GridDims::new(9, 4).unwrap();
        let input = PassInput::zeroed(grid);

        let output = gpu
            .run_compute_pass(&ShaderSource::Inline(COORD_SHADER.to_owned()), &input)
            .expect("dispatch");

        let mut tickets = Vec::new();
        for y in 0..grid.height {
            for x in 0..grid.width {
                let [px, py, b, ticket] = output.pixel(x, y);
                assert_eq!((px, py, b), (x, y, 7), "pixel ({x}, {y})");
                tickets.push(ticket);
            }
        }
        // Tickets start at zero because the lock is zeroed before dispatch.
        tickets.sort_unstable();
        let expected: Vec<u32> = (0..grid.width * grid.height).collect();
        assert_eq!(tickets, expected);
    }

    #[test]
    fn test_pipeline_is_reused_across_passes() {
        let Some(gpu) = gpu_or_skip() else { return };
        let input = PassInput::zeroed(GridDims::new(2, 2).unwrap());
        let shader = ShaderSource::Inline(COORD_SHADER.to_owned());

        let first = gpu.run_compute_pass(&shader, &input).unwrap();
        let second = gpu.run_compute_pass(&shader, &input).unwrap();
        assert_eq!(first.pixel(1, 1)[..3], second.pixel(1, 1)[..3]);
    }

    #[test]
    fn test_invalid_shader_reports_pipeline_error() {
        let Some(gpu) = gpu_or_skip() else { return };
        let input = PassInput::zeroed(GridDims::new(1, 1).unwrap());
        let result = gpu.run_compute_pass(&ShaderSource::Inline("fn main( {".to_owned()), &input);
        assert!(
            matches!(result, Err(ComputeError::Pipeline(_))),
            "Expected Pipeline error, got {result:?}"
        );
    }

    #[test]
    fn test_grid_over_storage_limit_is_rejected() {
        let Some(gpu) = gpu_or_skip() else { return };
        // 4096 * 2049 * 16 bytes is just over the 128 MiB downlevel binding limit.
        let grid = GridDims::new(4096, 2049).unwrap();

        let result = gpu.check_grid(&grid);
        assert!(
            matches!(result, Err(ComputeError::BufferTooLarge { requested: 134_283_264, .. })),
            "Expected BufferTooLarge, got {result:?}"
        );

        let result = gpu.run_compute_pass(&ShaderSource::Embedded, &PassInput::zeroed(grid));
        assert!(matches!(result, Err(ComputeError::BufferTooLarge { .. })), "got {result:?}");
    }

    #[test]
    fn test_wide_grid_exceeds_dispatch_limit() {
        let Some(gpu) = gpu_or_skip() else { return };
        let grid = GridDims::new(70_000, 1).unwrap();

        let result = gpu.run_compute_pass(&ShaderSource::Embedded, &PassInput::zeroed(grid));
        assert!(
            matches!(result, Err(ComputeError::DispatchTooLarge { requested: 70_000, .. })),
            "Expected DispatchTooLarge, got {result:?}"
        );
    }

    #[test]
    fn test_concurrent_passes_report_their_own_errors() {
        let Some(gpu) = gpu_or_skip() else { return };
        let input = PassInput::zeroed(GridDims::new(4, 4).unwrap());
        let broken = ShaderSource::Inline("fn main( {".to_owned());

        std::thread::scope(|s| {
            let good = s.spawn(|| {
                (0..8)
                    .map(|_| gpu.run_compute_pass(&ShaderSource::Embedded, &input))
                    .collect::<Vec<_>>()
            });
            let bad = s.spawn(|| {
                (0..8).map(|_| gpu.run_compute_pass(&broken, &input)).collect::<Vec<_>>()
            });

            for result in good.join().unwrap() {
                assert_eq!(result.unwrap().data, input.data);
            }
            for result in bad.join().unwrap() {
                assert!(matches!(result, Err(ComputeError::Pipeline(_))), "got {result:?}");
            }
        });
    }
}
