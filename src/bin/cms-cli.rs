use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "cms-cli")]
#[command(about = "Management CLI for the coffeehouse CMS", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Session token from `cms-cli login`
    #[arg(short, long, env = "CMS_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print a session token
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Print the current content document
    Content,
    /// Replace the editable sections from a JSON file
    Update { file: PathBuf },
    /// Upload an image (role: generic, hero, logo, favicon)
    Upload { role: String, file: PathBuf },
    /// Delete an uploaded image
    Delete { filename: String },
    /// List images in the upload directory
    Images,
    /// End the session
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Login { username, password } => {
            let res = client
                .post(format!("{}/api/login", base))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Content => {
            let res = client.get(format!("{}/api/content", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Update { file } => {
            let payload: Value = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            let res = client
                .post(format!("{}/api/update", base))
                .headers(auth_headers(cli.token.as_deref())?)
                .json(&payload)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Upload { role, file } => {
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or("upload path has no file name")?;
            let part = multipart::Part::bytes(std::fs::read(&file)?).file_name(filename);
            let form = multipart::Form::new().part("file", part);
            let res = client
                .post(format!("{}/api/upload/{}", base, role))
                .headers(auth_headers(cli.token.as_deref())?)
                .multipart(form)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Delete { filename } => {
            let res = client
                .post(format!("{}/api/delete_image", base))
                .headers(auth_headers(cli.token.as_deref())?)
                .json(&json!({ "filename": filename }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Images => {
            let res = client
                .get(format!("{}/api/images", base))
                .headers(auth_headers(cli.token.as_deref())?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Logout => {
            let res = client
                .post(format!("{}/api/logout", base))
                .headers(auth_headers(cli.token.as_deref())?)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn auth_headers(token: Option<&str>) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let token = token.ok_or("a session token is required (--token or CMS_TOKEN)")?;
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token))?,
    );
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: CMS API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
