//! vkboot windowed bootstrap
//!
//! Opens a window and walks the whole setup sequence for it: instance,
//! surface, physical device, logical device, swapchain and image views.
//! Resizing the window recreates the swapchain. Nothing is rendered.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p vkboot-window
//! ```
//!
//! ## Options
//!
//! - `-h, --help`: Print help message
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

use ash::vk;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vkboot::{
    Device, DeviceBuilder, Instance, InstanceBuilder, PhysicalDeviceSelector, QueueType,
    Swapchain, SwapchainBuilder,
};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App { state: None };
    event_loop.run_app(&mut app)?;
    Ok(())
}

struct App {
    state: Option<State>,
}

/// Everything created for the window, destroyed in reverse order.
struct State {
    instance: Instance,
    surface: vk::SurfaceKHR,
    device: Device,
    swapchain: Swapchain,
    image_views: Vec<vk::ImageView>,
    // Dropped last; the surface refers to it.
    #[allow(dead_code)]
    window: Window,
}

impl State {
    fn new(event_loop: &ActiveEventLoop) -> anyhow::Result<Self> {
        let window = event_loop.create_window(
            Window::default_attributes()
                .with_title("vkboot")
                .with_inner_size(PhysicalSize::new(WIDTH, HEIGHT)),
        )?;

        let instance = InstanceBuilder::new()
            .app_name("vkboot-window")
            .engine_name("vkboot")
            .request_validation_layers(cfg!(debug_assertions))
            .use_default_debug_messenger()
            .build()?;

        // SAFETY: the window is stored next to the surface and outlives it.
        let surface = match unsafe { instance.create_surface(&window) } {
            Ok(surface) => surface,
            Err(e) => {
                // SAFETY: nothing else was created from the instance.
                unsafe { instance.destroy() };
                return Err(e.into());
            }
        };

        let device = match create_device(&instance, surface) {
            Ok(device) => device,
            Err(e) => {
                // SAFETY: reverse creation order, nothing else uses them.
                unsafe {
                    instance.destroy_surface(surface);
                    instance.destroy();
                }
                return Err(e);
            }
        };

        let (swapchain, image_views) = match create_swapchain(&device, window.inner_size()) {
            Ok(created) => created,
            Err(e) => {
                // SAFETY: as above.
                unsafe {
                    device.destroy();
                    instance.destroy_surface(surface);
                    instance.destroy();
                }
                return Err(e);
            }
        };

        Ok(Self {
            instance,
            surface,
            device,
            swapchain,
            image_views,
            window,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) -> anyhow::Result<()> {
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }

        // SAFETY: the device is alive.
        unsafe { self.device.device().device_wait_idle()? };

        let swapchain = SwapchainBuilder::new(&self.device)
            .old_swapchain(self.swapchain.handle())
            .desired_extent(size.width, size.height)
            .build()?;

        // SAFETY: the device is idle and the new swapchain has replaced the old one.
        unsafe {
            self.swapchain.destroy_image_views(&self.image_views);
            self.swapchain.destroy();
        }
        self.image_views.clear();
        self.swapchain = swapchain;
        self.image_views = self.swapchain.image_views()?;

        info!(
            "Swapchain recreated at {}x{}",
            self.swapchain.extent().width,
            self.swapchain.extent().height
        );
        Ok(())
    }

    fn cleanup(&mut self) {
        // SAFETY: reverse creation order, after the device is idle.
        unsafe {
            if let Err(e) = self.device.device().device_wait_idle() {
                error!("Failed to wait for device idle: {e}");
            }
            self.swapchain.destroy_image_views(&self.image_views);
            self.image_views.clear();
            self.swapchain.destroy();
            self.device.destroy();
            self.instance.destroy_surface(self.surface);
            self.instance.destroy();
        }
    }
}

fn create_device(instance: &Instance, surface: vk::SurfaceKHR) -> anyhow::Result<Device> {
    let physical_device = PhysicalDeviceSelector::new(instance)
        .surface(surface)
        .select()?;
    let device = DeviceBuilder::new(instance, &physical_device).build()?;
    let queues = device
        .queue_index(QueueType::Graphics)
        .and_then(|graphics| Ok((graphics, device.queue_index(QueueType::Present)?)));
    match queues {
        Ok((graphics, present)) => {
            info!("Graphics queue family {graphics}, present queue family {present}");
            Ok(device)
        }
        Err(e) => {
            // SAFETY: the device was just created and is unused.
            unsafe { device.destroy() };
            Err(e.into())
        }
    }
}

fn create_swapchain(
    device: &Device,
    size: PhysicalSize<u32>,
) -> anyhow::Result<(Swapchain, Vec<vk::ImageView>)> {
    let swapchain = SwapchainBuilder::new(device)
        .desired_extent(size.width, size.height)
        .build()?;
    match swapchain.image_views() {
        Ok(views) => Ok((swapchain, views)),
        Err(e) => {
            // SAFETY: the swapchain was just created and has no views.
            unsafe { swapchain.destroy() };
            Err(e.into())
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match State::new(event_loop) {
            Ok(state) => {
                info!("Bootstrap complete");
                self.state = Some(state);
            }
            Err(e) => {
                error!("Failed to bootstrap Vulkan: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                if let Some(mut state) = self.state.take() {
                    state.cleanup();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    if let Err(e) = state.resize(size) {
                        error!("Failed to recreate swapchain: {e:#}");
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut state) = self.state.take() {
            state.cleanup();
        }
    }
}

fn print_help() {
    eprintln!(
        "vkboot windowed bootstrap

Creates a window, a Vulkan device and a swapchain for it, and recreates
the swapchain whenever the window is resized.

USAGE:
    vkboot-window [OPTIONS]

OPTIONS:
    -h, --help    Print this help message

ENVIRONMENT:
    RUST_LOG      Log filter, defaults to info"
    );
}
