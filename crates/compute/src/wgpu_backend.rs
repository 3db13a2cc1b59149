//! GPU implementation of [`ComputeBackend`] built on [`wgpu`].
//!
//! One pass is the fixed sequence upload → dispatch → readback:
//!
//! 1. the input grid is written into a host-visible staging buffer and copied
//!    into a device-local storage buffer, then the host waits for that
//!    submission;
//! 2. the dimensions uniform and a zeroed lock word are created and bound
//!    next to the storage buffer;
//! 3. the kernel is dispatched once over the grid and the storage buffer is
//!    copied into a mappable readback buffer in the same submission;
//! 4. the readback buffer is mapped and the host blocks until it is ready.
//!
//! Memory types and pipeline barriers are chosen by `wgpu` from the buffer
//! usages, so none of that is spelled out here.

use crate::grid::{GridDims, WorkgroupSize};
use crate::shader::{self, SpecializationConstants, ENTRY_POINT};
use crate::{layout, ComputeBackend, ComputeError, PassInput, PassOutput, ShaderSource};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use wgpu::util::DeviceExt;

/// Source hash and element count.
type PipelineKey = (u64, u32);

pub struct WgpuBackend {
    // Pipeline cache - Mutex for interior mutability with &self in run_compute_pass
    pipelines: Mutex<HashMap<PipelineKey, Arc<wgpu::ComputePipeline>>>,
    // Error scopes are a per-device stack, so passes must not interleave.
    pass_lock: Mutex<()>,
    pipeline_layout: wgpu::PipelineLayout,
    bind_group_layout: wgpu::BindGroupLayout,
    queue: Arc<wgpu::Queue>,
    device: Arc<wgpu::Device>,
    adapter_info: wgpu::AdapterInfo,
    workgroup_size: WorkgroupSize,
}

impl WgpuBackend {
    /// Opens the first suitable adapter and creates a device with one queue.
    ///
    /// `WGPU_BACKEND` restricts the backends that are tried and
    /// `WGPU_ADAPTER_NAME` forces a specific adapter. Debug builds enable the
    /// API's validation layers.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::BackendUnavailable`] when no adapter is found and
    /// [`ComputeError::DeviceRequest`] when the device cannot be created.
    pub fn try_new() -> Result<Self, ComputeError> {
        let backends = wgpu::util::backend_bits_from_env().unwrap_or_else(wgpu::Backends::all);
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            flags: wgpu::InstanceFlags::from_build_config().with_env(),
            ..Default::default()
        });
        let adapter = pollster::block_on(wgpu::util::initialize_adapter_from_env_or_default(
            &instance,
            None,
        ))
        .ok_or(ComputeError::BackendUnavailable)?;

        let adapter_info = adapter.get_info();
        tracing::info!("GPU: {} ({:?})", adapter_info.name, adapter_info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("scheduleviz-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        ))
        .map_err(|e| ComputeError::DeviceRequest(e.to_string()))?;

        device.on_uncaptured_error(Box::new(|error| {
            tracing::error!("[VALIDATION]: {error}");
        }));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scheduleviz_layout"),
            entries: &[
                buffer_layout_entry(layout::UNIFORM_DIMS, wgpu::BufferBindingType::Uniform),
                buffer_layout_entry(
                    layout::STORAGE_PIXELS,
                    wgpu::BufferBindingType::Storage { read_only: false },
                ),
                buffer_layout_entry(
                    layout::STORAGE_LOCK,
                    wgpu::BufferBindingType::Storage { read_only: false },
                ),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scheduleviz_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        Ok(Self {
            pipelines: Mutex::new(HashMap::new()),
            pass_lock: Mutex::new(()),
            pipeline_layout,
            bind_group_layout,
            queue: Arc::new(queue),
            device: Arc::new(device),
            adapter_info,
            workgroup_size: WorkgroupSize::default(),
        })
    }

    #[must_use]
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Returns the cached pipeline for `shader`, compiling it on first use.
    fn pipeline(
        &self,
        shader: &ShaderSource,
        constants: SpecializationConstants,
    ) -> Result<Arc<wgpu::ComputePipeline>, ComputeError> {
        let source = shader.load()?;
        let key = (shader::cache_key(&source), constants.buffer_elements);
        if let Some(pipeline) = self.pipelines.lock().get(&key) {
            return Ok(Arc::clone(pipeline));
        }

        let label = shader.label();
        tracing::debug!("compiling compute pipeline for {label}");
        let overrides = constants.to_overrides();

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label.as_ref()),
            source: wgpu::ShaderSource::Wgsl(source),
        });
        let pipeline = self.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("scheduleviz_pipeline"),
            layout: Some(&self.pipeline_layout),
            module: &module,
            entry_point: ENTRY_POINT,
            compilation_options: wgpu::PipelineCompilationOptions {
                constants: &overrides,
                zero_initialize_workgroup_memory: true,
            },
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ComputeError::Pipeline(err.to_string()));
        }

        let pipeline = Arc::new(pipeline);
        self.pipelines.lock().insert(key, Arc::clone(&pipeline));
        Ok(pipeline)
    }

    /// Copies `input` into a new device-local storage buffer through a
    /// staging buffer and waits for the copy to finish.
    fn upload(&self, input: &PassInput) -> wgpu::Buffer {
        let size = input.grid.byte_size();

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging"),
            size,
            usage: wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: true,
        });
        staging.slice(..).get_mapped_range_mut().copy_from_slice(input.as_bytes());
        staging.unmap();

        let device_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pixels"),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("upload_encoder") });
        encoder.copy_buffer_to_buffer(&staging, 0, &device_buffer, 0, size);
        let upload = self.queue.submit(Some(encoder.finish()));
        self.device.poll(wgpu::Maintain::WaitForSubmissionIndex(upload));

        device_buffer
    }
}

impl ComputeBackend for WgpuBackend {
    fn run_compute_pass(
        &self,
        shader: &ShaderSource,
        input: &PassInput,
    ) -> Result<PassOutput, ComputeError> {
        let grid = input.grid;
        if input.data.len() != grid.element_count() {
            return Err(ComputeError::ShapeMismatch(
                "input length does not match width * height * components",
            ));
        }

        self.check_grid(&grid)?;
        let size = grid.byte_size();
        let buffer_elements =
            u32::try_from(grid.element_count()).map_err(|_| ComputeError::InvalidDimensions)?;

        let _pass = self.pass_lock.lock();
        let pipeline = self.pipeline(shader, SpecializationConstants { buffer_elements })?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let device_buffer = self.upload(input);

        let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("dimensions"),
            contents: bytemuck::bytes_of(&grid.uniform()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lock_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lock"),
            contents: bytemuck::bytes_of(&0u32),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
        });
        debug_assert_eq!(lock_buffer.size(), layout::LOCK_SIZE);

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scheduleviz_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: layout::UNIFORM_DIMS,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: layout::STORAGE_PIXELS,
                    resource: device_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: layout::STORAGE_LOCK,
                    resource: lock_buffer.as_entire_binding(),
                },
            ],
        });

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let [x, y, z] = self.workgroup_size.workgroup_count(&grid);
        tracing::info!("Dispatching {x}x{y}x{z} workgroups over a {}x{} grid", grid.width, grid.height);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("compute_encoder") });
        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("scheduleviz_pass"),
                timestamp_writes: None,
            });
            cpass.set_pipeline(&pipeline);
            cpass.set_bind_group(layout::BIND_GROUP, &bind_group, &[]);
            cpass.dispatch_workgroups(x, y, z);
        }
        encoder.copy_buffer_to_buffer(&device_buffer, 0, &readback, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let slice = readback.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver outlives the poll below; a failed send means the pass was abandoned.
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ComputeError::Validation(err.to_string()));
        }

        match receiver.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ComputeError::BufferMap(e.to_string())),
            Err(_) => return Err(ComputeError::BufferMap("map callback never fired".to_owned())),
        }

        let output = {
            let mapped = slice.get_mapped_range();
            PassOutput::from_bytes(grid, &mapped)
        };
        readback.unmap();
        output
    }

    fn check_grid(&self, grid: &GridDims) -> Result<(), ComputeError> {
        let limits = self.device.limits();

        let requested = grid.byte_size();
        let limit = u64::from(limits.max_storage_buffer_binding_size);
        if requested > limit {
            return Err(ComputeError::BufferTooLarge { requested, limit });
        }

        let [x, y, z] = self.workgroup_size.workgroup_count(grid);
        let requested = x.max(y).max(z);
        let limit = limits.max_compute_workgroups_per_dimension;
        if requested > limit {
            return Err(ComputeError::DispatchTooLarge { requested, limit });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "wgpu"
    }
}

fn buffer_layout_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer { ty, has_dynamic_offset: false, min_binding_size: None },
        count: None,
    }
}
