//! Movie Relay - CLI Tool
//!
//! Command-line interface for browsing and editing the catalog through a relay.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use movie_relay::client::MovieFeed;
use movie_relay::events::ChangeEvent;
use movie_relay::movies::{MovieDraft, MoviePatch, MovieRecord};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

const RECONNECT_DELAY_MIN: Duration = Duration::from_millis(500);
const RECONNECT_DELAY_MAX: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "movies")]
#[command(about = "CLI for Movie Relay")]
struct Cli {
    /// Relay server URL
    #[arg(long, env = "MOVIE_RELAY_URL", default_value = "http://localhost:3001")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all movies
    List,

    /// Add a movie
    Add {
        /// Movie title
        #[arg(short, long)]
        title: String,

        /// Release year
        #[arg(short, long)]
        year: i32,
    },

    /// Update a movie
    Update {
        /// Movie ID
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New release year
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Delete a movie
    Delete {
        /// Movie ID
        id: String,
    },

    /// Follow the catalog live, printing it after every change
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let server = cli.server.trim_end_matches('/');

    match cli.command {
        Commands::List => handle_list(&client, server).await,
        Commands::Add { title, year } => {
            let draft = MovieDraft::new(title, year);
            let resp = client
                .post(format!("{}/api/movies", server))
                .json(&draft)
                .send()
                .await?;
            let movie: MovieRecord = check(resp).await?.json().await?;
            println!("Created movie: {}", movie.id);
            Ok(())
        }
        Commands::Update { id, title, year } => {
            if title.is_none() && year.is_none() {
                bail!("Nothing to update: pass --title and/or --year");
            }
            let patch = MoviePatch {
                title,
                year: year.map(Value::from),
            };
            let resp = client
                .put(format!("{}/api/movies/{}", server, urlencoding::encode(&id)))
                .json(&patch)
                .send()
                .await?;
            let movie: MovieRecord = check(resp).await?.json().await?;
            println!("Updated movie: {} ({}, {})", movie.id, movie.title, movie.year);
            Ok(())
        }
        Commands::Delete { id } => {
            let resp = client
                .delete(format!("{}/api/movies/{}", server, urlencoding::encode(&id)))
                .send()
                .await?;
            check(resp).await?;
            println!("Deleted movie: {}", id);
            Ok(())
        }
        Commands::Watch => handle_watch(server).await,
    }
}

async fn handle_list(client: &Client, server: &str) -> Result<()> {
    let resp = client
        .get(format!("{}/api/movies", server))
        .send()
        .await?;
    let movies: Vec<MovieRecord> = check(resp).await?.json().await?;
    print_movies(&movies);
    Ok(())
}

async fn handle_watch(server: &str) -> Result<()> {
    let mut feed = MovieFeed::connect(server).await?;
    print_movies(feed.movies());

    loop {
        while let Some(event) = feed.next_event().await {
            match &event {
                ChangeEvent::Created(movie) => println!("+ {} {}", movie.id, movie.title),
                ChangeEvent::Updated(movie) => println!("~ {} {}", movie.id, movie.title),
                ChangeEvent::Deleted(r) => println!("- {}", r.id),
            }
            print_movies(feed.movies());
        }

        eprintln!("Relay closed the connection, reconnecting...");
        let mut delay = RECONNECT_DELAY_MIN;
        loop {
            tokio::time::sleep(delay).await;
            match feed.reconnect().await {
                Ok(()) => break,
                Err(e) => {
                    eprintln!("Reconnect failed: {:#}", e);
                    delay = (delay * 2).min(RECONNECT_DELAY_MAX);
                }
            }
        }
        print_movies(feed.movies());
    }
}

/// Turn a non-2xx relay response into an error carrying its message
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body: Value = resp.json().await.unwrap_or(Value::Null);
    let message = body["error"].as_str().unwrap_or("unknown error");
    bail!("{} ({})", message, status)
}

fn print_movies(movies: &[MovieRecord]) {
    println!("{:<12} {:<6} {}", "ID", "YEAR", "TITLE");
    println!("{}", "-".repeat(60));
    for movie in movies {
        println!("{:<12} {:<6} {}", movie.id.as_str(), movie.year, movie.title);
    }
}
