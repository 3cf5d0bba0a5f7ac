use glam::Mat4;
use winit::dpi::LogicalSize;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::{event::*, event_loop::EventLoop, window::WindowBuilder};

use occl_core::{classify_points, SceneState, Strategy, TestError, Viewport};
use occl_native::renderer::SceneRenderer;
use occl_native::{query, readback};

struct GpuState<'w> {
    window: &'w winit::window::Window,
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: SceneRenderer,
    scene_state: SceneState,
    last_cursor: Option<(f32, f32)>,
    dragging: bool,
}

impl<'w> GpuState<'w> {
    async fn new(window: &'w winit::window::Window) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        log::info!("adapter: {:?}", adapter.get_info());
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps.formats[0];
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let scene_state = SceneState::new();
        let renderer =
            SceneRenderer::new(&device, format, size.width, size.height, &scene_state.scene);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            scene_state,
            last_cursor: None,
            dragging: false,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, new_size.width, new_size.height);
    }

    /// Viewport of the current render target, re-read every frame so resize
    /// never leaves stale dimensions in the projection math.
    fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let viewport = self.viewport();
        let view_proj = self.scene_state.camera.view_proj(viewport.aspect());
        self.renderer
            .update_uniforms(&self.queue, view_proj, viewport);

        // Occluder depth in its own submission: a pending test must consume
        // a depth buffer containing the occluder and nothing else.
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("depth-encoder"),
            });
        self.renderer.encode_depth_pass(&mut encoder);
        self.queue.submit(Some(encoder.finish()));

        if self.scene_state.begin_run() {
            self.run_test(view_proj, viewport);
        }

        self.renderer.update_markers(
            &self.queue,
            &self.scene_state.scene,
            self.scene_state.results(),
        );
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene-encoder"),
            });
        self.renderer.encode_color_pass(&mut encoder, &view);
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// One full visibility-test run with the selected strategy. A failed run
    /// leaves the previous result mapping on screen.
    fn run_test(&mut self, view_proj: Mat4, viewport: Viewport) {
        let outcome: Result<Vec<bool>, TestError> = match self.scene_state.strategy {
            Strategy::DepthReadback => {
                readback::read_depth_grid(&self.device, &self.queue, self.renderer.depth_texture())
                    .map(|grid| {
                        classify_points(&self.scene_state.scene.points, view_proj, viewport, &grid)
                    })
            }
            Strategy::OcclusionQuery => {
                query::run_query_strategy(&self.device, &self.queue, &self.renderer)
            }
        };
        match outcome {
            Ok(results) => {
                let occluded = results.iter().filter(|&&o| o).count();
                let mismatches = results
                    .iter()
                    .zip(&self.scene_state.scene.expected)
                    .filter(|(a, b)| a != b)
                    .count();
                log::info!(
                    "{}: {occluded}/{} occluded, {mismatches} disagree with the analytic baseline",
                    self.scene_state.strategy.label(),
                    results.len()
                );
                self.scene_state.complete_run(results);
            }
            Err(err) => {
                log::error!("visibility test aborted: {err}");
                self.scene_state.abort_run();
            }
        }
    }
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let event_loop = EventLoop::new().expect("event loop");
    let window = WindowBuilder::new()
        .with_title("Occlusion Debugger (native)")
        .with_inner_size(LogicalSize::new(900.0, 700.0))
        .build(&event_loop)
        .expect("window");

    let mut state = pollster::block_on(GpuState::new(&window)).expect("gpu");

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::Resized(size) => state.resize(size),
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::MouseInput {
                    state: pressed,
                    button: MouseButton::Left,
                    ..
                } => {
                    // Press anchors the drag at the last seen cursor position.
                    state.dragging = pressed == ElementState::Pressed;
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let pos = (position.x as f32, position.y as f32);
                    if state.dragging {
                        if let Some((lx, ly)) = state.last_cursor {
                            state.scene_state.camera.drag(pos.0 - lx, pos.1 - ly);
                        }
                    }
                    state.last_cursor = Some(pos);
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    let notches = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                    };
                    state.scene_state.camera.zoom_scroll(notches);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state == ElementState::Pressed && !event.repeat {
                        match event.physical_key {
                            PhysicalKey::Code(KeyCode::Space) => state.scene_state.request_test(),
                            PhysicalKey::Code(KeyCode::Tab) => state.scene_state.toggle_strategy(),
                            _ => {}
                        }
                    }
                }
                _ => {}
            },
            Event::AboutToWait => match state.render() {
                Ok(_) => state.window.request_redraw(),
                Err(wgpu::SurfaceError::Lost) => state.resize(state.window.inner_size()),
                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                Err(_) => {}
            },
            _ => {}
        })
        .unwrap();
}
