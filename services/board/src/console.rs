//! services/board/src/console.rs
//!
//! Line-oriented front end for the board. Each input line is one command; the
//! reply is written back and the session continues until `quit` or end of input.
//!
//! Access rules live here, not in the store: commands that need an identity
//! refuse to run while logged out, admin pages are limited to admins, and a
//! post can only be deleted by the user who created it.

use lost_found_core::domain::{Post, PostId, PostKind, Role, User};
use lost_found_core::store::{LocalDataStore, StoreError};
use lost_found_core::validation;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

use crate::error::BoardError;

const HELP: &str = "\
Commands:
  register <email> <password> <confirm> <lost|found|admin>
  login <email> <password>
  logout
  whoami
  post <title> | <description> | <location> [| <image url>]
  search [query]
  filter <all|lost|found>        (admin)
  mine                           (your posts)
  delete <post id>               (your posts)
  users                          (admin)
  posts                          (admin, oldest first)
  stats                          (admin)
  help
  quit";

/// The result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub quit: bool,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

type CommandResult = Result<String, String>;

pub struct Console {
    store: LocalDataStore,
    /// Kind filter chosen by an admin; other roles always use their default.
    admin_filter: Option<PostKind>,
}

impl Console {
    /// Wraps an initialized store.
    pub fn new(store: LocalDataStore) -> Self {
        Self {
            store,
            admin_filter: None,
        }
    }

    pub fn store(&self) -> &LocalDataStore {
        &self.store
    }

    /// Reads commands until `quit` or end of input, writing every reply.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<(), BoardError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        output
            .write_all(b"Lost & Found board. Type 'help' for commands.\n> ")
            .await?;
        output.flush().await?;

        while let Some(line) = lines.next_line().await? {
            let reply = self.execute(&line).await;
            if !reply.text.is_empty() {
                output.write_all(reply.text.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
            if reply.quit {
                break;
            }
            output.write_all(b"> ").await?;
            output.flush().await?;
        }
        output.flush().await?;
        Ok(())
    }

    /// Runs a single command line.
    pub async fn execute(&mut self, line: &str) -> Reply {
        let line = line.trim_start();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim_start()),
            None => (line, ""),
        };
        debug!(command, "Handling command");

        let result = match command {
            "" => Ok(String::new()),
            "help" => Ok(HELP.to_string()),
            "quit" | "exit" => {
                return Reply {
                    text: "Bye.".to_string(),
                    quit: true,
                }
            }
            "register" => self.register(rest).await,
            "login" => self.login(rest).await,
            "logout" => self.logout().await,
            "whoami" => Ok(self.whoami()),
            "post" => self.post(rest).await,
            "search" => self.search(rest),
            "filter" => self.filter(rest),
            "mine" => self.mine(),
            "delete" => self.delete(rest).await,
            "users" => self.users(),
            "posts" => self.all_posts(),
            "stats" => self.stats(),
            other => Err(format!("Unknown command '{}'. Type 'help' for commands.", other)),
        };

        match result {
            Ok(text) => Reply::text(text),
            Err(message) => Reply::text(format!("Error: {}", message)),
        }
    }

    // --- Authentication ---

    async fn register(&mut self, args: &str) -> CommandResult {
        self.require_logged_out()?;
        let [email, password, confirm, role] = words::<4>(args)
            .ok_or("usage: register <email> <password> <confirm> <lost|found|admin>")?;
        validation::validate_registration(email, password, confirm).map_err(|e| e.to_string())?;
        let role = role.parse::<Role>().map_err(|e| e.to_string())?;

        let user = self
            .store
            .register(email, password, role)
            .await
            .map_err(store_message)?;
        Ok(format!("Welcome, {}! You are registered as {}.", user.email, user.role))
    }

    async fn login(&mut self, args: &str) -> CommandResult {
        self.require_logged_out()?;
        let [email, password] = words::<2>(args).ok_or("usage: login <email> <password>")?;
        let user = self.store.login(email, password).await.map_err(store_message)?;
        Ok(format!("Logged in as {} ({}).", user.email, user.role))
    }

    async fn logout(&mut self) -> CommandResult {
        self.require_user()?;
        self.store.logout().await.map_err(store_message)?;
        self.admin_filter = None;
        Ok("Logged out.".to_string())
    }

    fn whoami(&self) -> String {
        match self.store.session() {
            Some(session) => format!("Logged in as {} ({}).", session.email, session.role),
            None => "Not logged in.".to_string(),
        }
    }

    // --- Posts ---

    async fn post(&mut self, args: &str) -> CommandResult {
        let user = self.require_user()?;
        let kind = user
            .role
            .post_kind()
            .ok_or("Admins cannot create posts.")?;

        let fields: Vec<&str> = args.split('|').map(str::trim).collect();
        let (title, description, location, image_url) = match fields.as_slice() {
            [title, description, location] => (*title, *description, *location, ""),
            [title, description, location, image_url] => (*title, *description, *location, *image_url),
            _ => return Err("usage: post <title> | <description> | <location> [| <image url>]".to_string()),
        };
        validation::validate_post(title, description, location).map_err(|e| e.to_string())?;

        let post = self
            .store
            .create_post(title, description, location, kind, image_url)
            .await
            .map_err(store_message)?;
        Ok(format!("Posted {} item {}.", post.kind, post.id))
    }

    fn search(&self, query: &str) -> CommandResult {
        let user = self.require_user()?;
        let filter = if user.role.is_admin() {
            self.admin_filter
        } else {
            user.role.default_search_filter()
        };

        let results = self.store.search_posts(query, filter);
        if results.is_empty() {
            return Ok(if query.trim().is_empty() {
                "No items available yet.".to_string()
            } else {
                "No items found matching your search.".to_string()
            });
        }
        Ok(render_posts(&results))
    }

    fn filter(&mut self, args: &str) -> CommandResult {
        self.require_admin()?;
        self.admin_filter = match args.trim() {
            "all" => None,
            other => Some(
                other
                    .parse::<PostKind>()
                    .map_err(|_| "usage: filter <all|lost|found>".to_string())?,
            ),
        };
        Ok(match self.admin_filter {
            Some(kind) => format!("Showing {} items.", kind),
            None => "Showing all items.".to_string(),
        })
    }

    fn mine(&self) -> CommandResult {
        let user = self.require_user()?;
        if user.role.is_admin() {
            return Err("Admins do not have posts.".to_string());
        }
        let posts = self.store.posts_by(&user.id);
        if posts.is_empty() {
            return Ok("You have not posted anything yet.".to_string());
        }
        Ok(render_posts(&posts))
    }

    async fn delete(&mut self, args: &str) -> CommandResult {
        let user = self.require_user()?;
        let [id] = words::<1>(args).ok_or("usage: delete <post id>")?;
        let post_id = PostId::from(id);

        let owner = self
            .store
            .posts()
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| p.posted_by.clone())
            .ok_or_else(|| format!("No post with id {}.", post_id))?;
        if owner != user.id {
            return Err("You can only delete your own posts.".to_string());
        }

        self.store.delete_post(&post_id).await.map_err(store_message)?;
        Ok(format!("Deleted post {}.", post_id))
    }

    // --- Admin ---

    fn users(&self) -> CommandResult {
        self.require_admin()?;
        let users = self.store.users();
        if users.is_empty() {
            return Ok("No users found.".to_string());
        }
        Ok(users
            .iter()
            .map(|u| format!("{:<32} {:<6} joined {}", u.email, u.role, u.created_at.format("%b %-d, %Y")))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn all_posts(&self) -> CommandResult {
        self.require_admin()?;
        let posts = self.store.posts();
        if posts.is_empty() {
            return Ok("No posts yet.".to_string());
        }
        Ok(render_posts(posts))
    }

    fn stats(&self) -> CommandResult {
        self.require_admin()?;
        let stats = self.store.stats();
        Ok(format!(
            "Total users: {}\nTotal posts: {}\nLost items:  {}\nFound items: {}",
            stats.total_users, stats.total_posts, stats.lost_posts, stats.found_posts
        ))
    }

    // --- Guards ---

    fn require_user(&self) -> Result<User, String> {
        self.store
            .current_user()
            .cloned()
            .ok_or_else(|| "Please log in first.".to_string())
    }

    fn require_admin(&self) -> Result<User, String> {
        let user = self.require_user()?;
        if !user.role.is_admin() {
            return Err("This command is only available to admins.".to_string());
        }
        Ok(user)
    }

    fn require_logged_out(&self) -> Result<(), String> {
        match self.store.current_user() {
            Some(user) => Err(format!("Already logged in as {}. Log out first.", user.email)),
            None => Ok(()),
        }
    }
}

fn store_message(e: StoreError) -> String {
    if let StoreError::Storage(inner) = &e {
        error!("Storage failure: {}", inner);
    }
    e.to_string()
}

/// Splits `args` into exactly `N` whitespace-separated words.
fn words<const N: usize>(args: &str) -> Option<[&str; N]> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    parts.try_into().ok()
}

fn render_posts(posts: &[Post]) -> String {
    posts.iter().map(render_post).collect::<Vec<_>>().join("\n")
}

fn render_post(post: &Post) -> String {
    let mut out = format!(
        "{}  [{}] {} @ {}\n    {}\n    posted {}",
        post.id,
        post.kind,
        post.title,
        post.location,
        post.description,
        post.created_at.format("%b %-d, %Y %H:%M")
    );
    if !post.image_url.is_empty() {
        out.push_str(" (image attached)");
    }
    out
}
