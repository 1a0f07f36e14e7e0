mod host;
#[cfg(feature = "linux-hw")]
mod hw;
#[cfg(any(test, not(feature = "linux-hw")))]
mod sim;
mod web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
