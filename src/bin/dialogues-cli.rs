use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "dialogues-cli")]
#[command(about = "Command-line client for the dialogues service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8001", env = "DIALOGUES_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DialogueFields {
    #[arg(long)]
    user_id: i64,
    #[arg(long)]
    conversation_id: String,
    #[arg(long)]
    speaker: String,
    #[arg(long)]
    content: String,
}

impl DialogueFields {
    fn query(&self) -> [(&'static str, String); 4] {
        [
            ("user_id", self.user_id.to_string()),
            ("conversation_id", self.conversation_id.clone()),
            ("speaker", self.speaker.clone()),
            ("content", self.content.clone()),
        ]
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check which service is listening
    Root,
    /// Fetch one dialogue
    Get { id: i64 },
    /// List all dialogues
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        size: Option<u32>,
    },
    /// List dialogues of one user
    FromUser { user_id: i64 },
    /// List dialogues of one conversation
    FromConversation { conversation_id: String },
    /// Create a dialogue synchronously
    Create(DialogueFields),
    /// Submit a dialogue for deferred writing
    Submit(DialogueFields),
    /// Check a deferred write
    Status { task_id: String },
    /// Poll a deferred write until it finishes
    Wait {
        task_id: String,
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Root => {
            let res = client.get(format!("{}/", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Get { id } => {
            let res = client.get(format!("{}/dialogues/{}", base, id)).send().await?;
            print_response(res).await?;
        }
        Commands::List { page, size } => {
            let mut query = Vec::new();
            if let Some(page) = page {
                query.push(("page", page));
            }
            if let Some(size) = size {
                query.push(("size", size));
            }
            let res = client
                .get(format!("{}/dialogues", base))
                .query(&query)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::FromUser { user_id } => {
            let res = client
                .get(format!("{}/dialogues/from_user/{}", base, user_id))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::FromConversation { conversation_id } => {
            let res = client
                .get(format!("{}/dialogues/from_conversation/{}", base, conversation_id))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Create(fields) => {
            let res = client
                .post(format!("{}/dialogues", base))
                .query(&fields.query())
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Submit(fields) => {
            let res = client
                .post(format!("{}/dialogues/async", base))
                .query(&fields.query())
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Status { task_id } => {
            let res = client
                .get(format!("{}/dialogues/async_check/{}", base, task_id))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Wait { task_id, interval_ms } => {
            let url = format!("{}/dialogues/async_check/{}", base, task_id);
            loop {
                let res = client.get(&url).send().await?;
                if !res.status().is_success() {
                    print_response(res).await?;
                    break;
                }
                let json: Value = res.json().await?;
                if json["status"] != "working" {
                    println!("{}", serde_json::to_string_pretty(&json)?);
                    break;
                }
                eprintln!("{}", json["message"].as_str().unwrap_or("still working"));
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
