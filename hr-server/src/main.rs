#[tokio::main]
async fn main() {
    hr_server::run().await;
}
