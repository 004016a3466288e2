use clap::Args;
use productivity_core::{ChatClient, Transport};

#[derive(Args)]
pub struct ChatCommand {
    /// Message for the assistant
    #[arg(required = true, num_args = 1..)]
    pub message: Vec<String>,
}

impl ChatCommand {
    pub fn run<T: Transport>(self, base_url: &str, transport: &T) {
        let message = self.message.join(" ");
        match ChatClient::new(base_url).send(&message, transport) {
            Ok(reply) => println!("{reply}"),
            Err(e) => tracing::warn!("Not sent: {}", e),
        }
    }
}
