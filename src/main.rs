#[tokio::main]
async fn main() {
    std::process::exit(listscan::app::startup::startup().await);
}
