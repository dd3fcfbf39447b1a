//! List the serial ports visible on this system.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example list_ports
//! ```

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let ports = ttyport::list_ports();
    println!("Serial Port Detection Utility");
    println!("{:=<70}", "");
    println!();

    if ports.is_empty() {
        println!("No serial ports detected on this system");
        println!();
        println!("This could mean:");
        println!("  - No serial devices are connected");
        println!("  - USB-to-serial drivers are not installed");
        println!("  - Insufficient permissions to access serial ports");
        return;
    }

    println!("Found {} serial port(s):", ports.len());
    println!();

    for (idx, port) in ports.iter().enumerate() {
        println!("{}. {}", idx + 1, port.system_path);
        println!("{:-<70}", "");
        println!("   Name:         {}", port.friendly_name);
        println!("   Description:  {}", port.description);
        println!();
    }
}
