//! Command execution against the library backend.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use chrono::Local;
use libris_core::auth::RegisterOutcome;
use libris_core::models::{BookFilters, PasswordChange, RegisterRequest};
use libris_core::{ApiClient, Config, SessionIdentity};
use tracing::{info, warn};

use crate::cli::{AdminCommands, Commands};
use crate::output;

pub struct CommandExecutor {
    config: Config,
    client: ApiClient,
}

impl CommandExecutor {
    pub fn new(config: Config, api_url: Option<String>) -> Result<Self> {
        let credentials = config
            .credential_store()
            .context("Failed to open credential store")?;
        let mut builder = ApiClient::from_config(&config, credentials).on_session_expired(|reason| {
            warn!(%reason, "Session expired");
            eprintln!("Your session has expired. Run `libris login` to sign in again.");
        });
        if let Some(url) = api_url {
            builder = builder.base_url(url);
        }
        let client = builder.build()?;
        info!(base_url = client.base_url(), "Client ready");

        Ok(Self { config, client })
    }

    pub async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Login { email } => self.login(email).await,
            Commands::Register { name, email } => self.register(name, email).await,
            Commands::Logout => {
                self.client.logout().await?;
                println!("Logged out.");
                Ok(())
            }
            Commands::Whoami => {
                match self.client.current_session()? {
                    Some(identity) => output::print_identity(&identity),
                    None => println!("Not logged in."),
                }
                Ok(())
            }
            Commands::Refresh => {
                self.client.refresh_session().await?;
                println!("Session refreshed.");
                Ok(())
            }
            Commands::Dashboard => self.dashboard().await,
            Commands::Books {
                category,
                author,
                available,
            } => {
                let filters = BookFilters {
                    category,
                    author,
                    available: available.then_some(true),
                };
                output::print_books(&self.client.fetch_books(&filters).await?);
                Ok(())
            }
            Commands::Search { query, category } => {
                let filters = BookFilters {
                    category,
                    ..Default::default()
                };
                output::print_books(&self.client.search_books(&query, &filters).await?);
                Ok(())
            }
            Commands::Book { id } => {
                output::print_book(&self.client.fetch_book(id).await?);
                Ok(())
            }
            Commands::Borrow { book_id } => {
                let user = self.require_session()?;
                let record = self.client.borrow_book(user.user_id, book_id).await?;
                println!(
                    "Borrowed \"{}\" (loan {}), due {}.",
                    record.book_title(),
                    record.id,
                    record
                        .due_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
                Ok(())
            }
            Commands::Return { borrow_id } => {
                let record = self.client.return_book(borrow_id).await?;
                println!("Returned \"{}\".", record.book_title());
                Ok(())
            }
            Commands::Extend { borrow_id } => {
                let record = self.client.extend_borrow(borrow_id).await?;
                println!(
                    "Loan {} now due {}.",
                    record.id,
                    record
                        .due_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
                Ok(())
            }
            Commands::Loans => {
                output::print_borrows(&self.client.fetch_my_borrows().await?);
                Ok(())
            }
            Commands::Reserve { book_id } => {
                let user = self.require_session()?;
                let reservation = self.client.create_reservation(user.user_id, book_id).await?;
                match reservation.queue_position {
                    Some(position) => println!(
                        "Reservation {} created, position {} in queue.",
                        reservation.id, position
                    ),
                    None => println!("Reservation {} created.", reservation.id),
                }
                Ok(())
            }
            Commands::Reservations => {
                output::print_reservations(&self.client.fetch_my_reservations().await?);
                Ok(())
            }
            Commands::Cancel { reservation_id } => {
                self.client.cancel_reservation(reservation_id).await?;
                println!("Reservation {} cancelled.", reservation_id);
                Ok(())
            }
            Commands::Position { reservation_id } => {
                match self.client.fetch_queue_position(reservation_id).await? {
                    Some(position) => println!("Position {} in queue.", position),
                    None => println!("Not queued."),
                }
                Ok(())
            }
            Commands::Fines { unpaid } => {
                let fines = if unpaid {
                    self.client.fetch_my_unpaid_fines().await?
                } else {
                    self.client.fetch_my_fines().await?
                };
                output::print_fines(&fines);
                Ok(())
            }
            Commands::Pay { fine_id } => {
                let fine = self.client.pay_fine(fine_id).await?;
                println!("Paid fine {} ({:.2}).", fine.id, fine.amount);
                Ok(())
            }
            Commands::PayAll => {
                let fines = self.client.pay_all_fines().await?;
                let total: f64 = fines.iter().map(|f| f.amount).sum();
                println!("Paid {} fine(s), {:.2} in total.", fines.len(), total);
                Ok(())
            }
            Commands::Preview { due, returned } => {
                let returned = returned.unwrap_or_else(|| Local::now().date_naive());
                output::print_fine_preview(&self.client.preview_fine(due, returned).await?);
                Ok(())
            }
            Commands::Recommendations => {
                let user = self.require_session()?;
                output::print_books(&self.client.fetch_recommendations(user.user_id).await?);
                Ok(())
            }
            Commands::Passwd => self.change_password().await,
            Commands::Admin(command) => self.admin(command).await,
        }
    }

    async fn admin(&self, command: AdminCommands) -> Result<()> {
        let user = self.require_session()?;
        if !user.is_admin() {
            bail!("Administrator role required");
        }

        match command {
            AdminCommands::Stats => output::print_admin_stats(&self.client.fetch_admin_stats().await?),
            AdminCommands::Users => output::print_users(&self.client.fetch_all_users().await?),
            AdminCommands::Overdue => {
                output::print_borrows(&self.client.fetch_overdue_borrows().await?)
            }
            AdminCommands::Fines { unpaid, user } => {
                let fines = match (user, unpaid) {
                    (Some(user_id), _) => self.client.fetch_user_fines(user_id).await?,
                    (None, true) => self.client.fetch_all_unpaid_fines().await?,
                    (None, false) => self.client.fetch_all_fines().await?,
                };
                output::print_fines(&fines);
            }
            AdminCommands::FineStats => {
                output::print_fine_statistics(&self.client.fetch_fine_statistics().await?)
            }
            AdminCommands::Waive { fine_id } => {
                self.client.waive_fine(fine_id).await?;
                println!("Fine {} waived.", fine_id);
            }
            AdminCommands::Ready { reservation_id } => {
                self.client.mark_reservation_ready(reservation_id).await?;
                println!("Reservation {} ready for pickup.", reservation_id);
            }
            AdminCommands::Fulfill { reservation_id } => {
                let record = self.client.fulfill_reservation(reservation_id).await?;
                println!("Reservation {} fulfilled as loan {}.", reservation_id, record.id);
            }
            AdminCommands::DeleteBook { id } => {
                self.client.delete_book(id).await?;
                println!("Book {} deleted.", id);
            }
            AdminCommands::DeleteUser { id } => {
                self.client.delete_user(id).await?;
                println!("User {} deleted.", id);
            }
        }
        Ok(())
    }

    async fn login(&mut self, email: Option<String>) -> Result<()> {
        let email = match email.or_else(|| self.config.last_email.clone()) {
            Some(email) => email,
            None => prompt("Email: ")?,
        };
        let password = rpassword::prompt_password("Password: ")?;
        if email.is_empty() || password.is_empty() {
            bail!("Email and password required");
        }

        let identity = self.client.login(&email, &password).await?;
        self.remember_email(&email);
        println!("Logged in as {} ({}).", identity.name, identity.role);
        Ok(())
    }

    async fn register(&mut self, name: String, email: String) -> Result<()> {
        let password = rpassword::prompt_password("Password: ")?;
        let confirm = rpassword::prompt_password("Confirm password: ")?;
        if password != confirm {
            bail!("Passwords do not match");
        }

        let request = RegisterRequest {
            name,
            email: email.clone(),
            password,
        };
        match self.client.register(&request).await? {
            RegisterOutcome::LoggedIn(identity) => {
                println!("Account created. Logged in as {}.", identity.name)
            }
            RegisterOutcome::PendingLogin => {
                println!("Account created. Run `libris login` to sign in.")
            }
        }
        self.remember_email(&email);
        Ok(())
    }

    async fn change_password(&self) -> Result<()> {
        let user = self.require_session()?;
        let current_password = rpassword::prompt_password("Current password: ")?;
        let new_password = rpassword::prompt_password("New password: ")?;
        self.client
            .change_password(
                user.user_id,
                &PasswordChange {
                    current_password,
                    new_password,
                },
            )
            .await?;
        println!("Password changed.");
        Ok(())
    }

    /// Loans, reservations and fines fetched concurrently. When the access
    /// token has expired all three share one refresh.
    async fn dashboard(&self) -> Result<()> {
        let user = self.require_session()?;
        let (borrows, reservations, summary) = futures::try_join!(
            self.client.fetch_my_borrows(),
            self.client.fetch_my_reservations(),
            self.client.fetch_my_fine_summary(),
        )?;

        println!("Welcome back, {}.\n", user.name);
        let active: Vec<_> = borrows.into_iter().filter(|b| !b.is_returned()).collect();
        output::print_borrows(&active);
        println!();
        let pending: Vec<_> = reservations.into_iter().filter(|r| r.is_active()).collect();
        output::print_reservations(&pending);
        println!();
        output::print_fine_summary(&summary);
        Ok(())
    }

    fn require_session(&self) -> Result<SessionIdentity> {
        self.client
            .current_session()?
            .context("Not logged in. Run `libris login` first.")
    }

    fn remember_email(&mut self, email: &str) {
        if self.config.last_email.as_deref() == Some(email) {
            return;
        }
        self.config.last_email = Some(email.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
