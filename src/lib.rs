// src/lib.rs
pub mod application;
pub mod cli;
pub mod constants;
pub mod domain;
pub mod infrastructure;
pub mod ports;
pub mod util;

use crate::cli::args::{Args, Command};
use anyhow::Result;
use application::{IdentityProvider, NotesClient};
use constants::{NOTES_FILE_NAME, OBJECTS_DIR_NAME};
use domain::{DraftImage, DraftNote, User};
use infrastructure::{Config, ContentRenderer, FileObjectStore, JsonRecordStore, LocalIdentity};
use ports::{HtmlPresenter, TextPresenter};
use tracing::{debug, info};

pub type LocalNotesClient = NotesClient<JsonRecordStore, FileObjectStore>;

pub async fn run(args: Args) -> Result<()> {
    debug!(?args, "Starting notesync with arguments");

    // Initialize infrastructure
    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(dir) = &args.data_dir {
        debug!(?dir, "Using provided data directory");
        config.storage.data_dir = dir.to_string_lossy().into_owned();
    }
    let identity = LocalIdentity::new(config.data_dir()?);

    match args.command {
        Command::SignIn { username } => {
            let user = identity.sign_in(&username).await?;
            println!("Hello, {}", user.display_name());
        }
        Command::SignOut => {
            identity.sign_out().await?;
            println!("Signed out");
        }
        Command::Whoami => match identity.current_user().await? {
            Some(user) => println!("Hello, {}", user.display_name()),
            None => println!("Not signed in"),
        },
        Command::List { json } => {
            let (_, client) = open_client(&config, &identity).await?;
            let notes = client.refresh().await?;
            let presenter = TextPresenter::new();
            if json {
                println!("{}", presenter.render_json(&notes)?);
            } else {
                print!("{}", presenter.render(&notes));
            }
        }
        Command::Create {
            name,
            description,
            image,
        } => {
            let (_, client) = open_client(&config, &identity).await?;
            let mut draft = DraftNote::new(name, description);
            if let Some(path) = image {
                draft = draft.with_image(DraftImage::from_path(path).await?);
            }
            match client.create(&mut draft).await? {
                Some(id) => println!("Created note {id}"),
                None => println!("Skipped: name and description are required"),
            }
        }
        Command::Delete { note_id } => {
            let (_, client) = open_client(&config, &identity).await?;
            client.remove(&note_id).await?;
            println!("Deleted note {note_id}");
        }
        Command::View => {
            let (user, client) = open_client(&config, &identity).await?;
            let notes = client.refresh().await?;

            let html = HtmlPresenter::new().render(user.display_name(), &notes);
            let mut renderer = ContentRenderer::new();
            let path = renderer.create_temp_file(&html)?;
            info!(?path, count = notes.len(), "Opening notes page");
            renderer.open_in_browser(&path).await?;
        }
    }

    Ok(())
}

/// Build a notes client over the signed-in user's local stores
pub async fn open_client(
    config: &Config,
    identity: &LocalIdentity,
) -> Result<(User, LocalNotesClient)> {
    let user = identity.require_user().await?;
    let user_dir = identity.user_dir(&user);
    debug!(?user_dir, username = %user.username, "Opening user stores");

    let records = JsonRecordStore::new(user_dir.join(NOTES_FILE_NAME));
    let objects = FileObjectStore::new(
        user_dir.join(OBJECTS_DIR_NAME),
        config.urls.ttl_secs,
        config.urls.signing_secret.clone(),
    );
    let client = NotesClient::new(records, objects).with_key_generator(config.keys.generator());
    client
        .subscribe(|notes| debug!(count = notes.len(), "Note list updated"))
        .await;

    Ok((user, client))
}
