//! vkboot capability report
//!
//! Prints what the Vulkan loader offers and which physical devices vkboot
//! would select for a headless instance, best first.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p vkboot-info
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
use tracing::info;
use tracing_subscriber::EnvFilter;
use vkboot::{InstanceBuilder, PhysicalDeviceSelector, SystemInfo};

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

    let system = SystemInfo::query()?;
    match system.reported_instance_version() {
        Some(version) => println!("Instance version: {version}"),
        None => println!("Instance version: unknown"),
    }
    println!(
        "Validation layers: {}",
        if system.validation_layers_available() { "available" } else { "missing" }
    );
    println!(
        "Debug utils: {}",
        if system.debug_utils_available() { "available" } else { "missing" }
    );

    println!("Layers ({}):", system.available_layers().len());
    for layer in system.available_layers() {
        println!("  {}", layer.to_string_lossy());
    }
    println!("Extensions ({}):", system.available_extensions().len());
    for extension in system.available_extensions() {
        println!("  {}", extension.to_string_lossy());
    }

    let instance = InstanceBuilder::new()
        .app_name("vkboot-info")
        .engine_name("vkboot")
        .headless(true)
        .request_validation_layers(cfg!(debug_assertions))
        .use_default_debug_messenger()
        .build()?;
    info!(
        "Instance ready (loader {}, API {})",
        instance.instance_version(),
        instance.api_version()
    );

    let report = report_devices(&instance);

    // SAFETY: nothing else was created from the instance.
    unsafe { instance.destroy() };
    report
}

fn report_devices(instance: &vkboot::Instance) -> anyhow::Result<()> {
    let devices = PhysicalDeviceSelector::new(instance).select_devices()?;
    println!("Suitable devices ({}):", devices.len());
    for device in &devices {
        let memory = device.memory_properties();
        let device_local: vk::DeviceSize = memory
            .memory_heaps_as_slice()
            .iter()
            .filter(|heap| heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
            .map(|heap| heap.size)
            .sum();
        println!(
            "  {} ({:?}, Vulkan {}, {} MiB device-local, {:?})",
            device.name(),
            device.device_type(),
            device.api_version(),
            device_local >> 20,
            device.suitability()
        );
        println!(
            "    queues: {} families, dedicated compute: {}, dedicated transfer: {}",
            device.queue_families().len(),
            device.has_dedicated_compute_queue(),
            device.has_dedicated_transfer_queue()
        );
    }
    Ok(())
}

fn print_help() {
    eprintln!(
        "vkboot capability report

Prints the Vulkan loader's layers, extensions and instance version, then
lists every physical device a headless selection would accept.

USAGE:
    vkboot-info [OPTIONS]

OPTIONS:
    -h, --help    Print this help message

ENVIRONMENT:
    RUST_LOG      Log filter, defaults to info"
    );
}
