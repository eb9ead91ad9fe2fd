use pipeline::runner::{run, Stage};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    run(Stage::Decompress).await;
}
