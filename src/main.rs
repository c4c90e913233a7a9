#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = lanexam::run().await {
        eprintln!("lanexam fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
