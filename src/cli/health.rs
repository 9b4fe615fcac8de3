use std::error::Error;

use crate::core::chat_stream::HttpTransport;

pub async fn run_health(transport: HttpTransport) -> Result<(), Box<dyn Error>> {
    let url = transport.health_url();
    match transport.health().await {
        Ok(health) if health.is_ok() => {
            println!("✅ {url}: {}", health.status);
            Ok(())
        }
        Ok(health) => {
            eprintln!("⚠️  {url} reported status: {}", health.status);
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("❌ Health check failed for {url}: {err}");
            std::process::exit(1);
        }
    }
}
