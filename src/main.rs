mod cli;
mod config;
mod errors;
mod front_matter;
mod markdown;
mod pipeline;
mod server;
mod template;
mod utils;
mod validator;
mod watcher;

#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() {
    cli::run().await;
}
