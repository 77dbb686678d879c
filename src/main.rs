#[tokio::main]
async fn main() {
    voteboard::start_server().await;
}
