#[tokio::main]
async fn main() -> std::io::Result<()> {
    let report = platform_racer::run_with_config().await?;
    if !report.consistent {
        return Err(std::io::Error::other("replicas diverged"));
    }
    Ok(())
}
