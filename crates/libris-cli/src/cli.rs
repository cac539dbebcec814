use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Command-line client for the library management service
#[derive(Parser, Debug)]
#[command(name = "libris")]
#[command(about = "Command-line client for the library management service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Backend base URL (overrides config and LIBRIS_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login {
        /// Account email (default: last email used)
        email: Option<String>,
    },

    /// Create an account
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,
    },

    /// End the session and clear stored credentials
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Exchange the refresh token for a new access token now
    Refresh,

    /// Loans, reservations and fines at a glance
    Dashboard,

    /// List the catalogue
    Books {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        author: Option<String>,

        /// Only books with a copy on the shelf
        #[arg(long)]
        available: bool,
    },

    /// Search the catalogue by title, author or ISBN
    Search {
        query: String,

        #[arg(long)]
        category: Option<String>,
    },

    /// Show one book
    Book { id: i64 },

    /// Borrow a book
    Borrow { book_id: i64 },

    /// Return a borrowed book
    Return { borrow_id: i64 },

    /// Extend the due date of a loan
    Extend { borrow_id: i64 },

    /// List your loans
    Loans,

    /// Reserve a book that is currently out
    Reserve { book_id: i64 },

    /// List your reservations
    Reservations,

    /// Cancel a reservation
    Cancel { reservation_id: i64 },

    /// Show a reservation's place in the queue
    Position { reservation_id: i64 },

    /// List your fines
    Fines {
        /// Only unpaid fines
        #[arg(long)]
        unpaid: bool,
    },

    /// Pay one fine
    Pay { fine_id: i64 },

    /// Pay every unpaid fine
    PayAll,

    /// Preview the fine for returning a book on a given date
    Preview {
        /// Due date (YYYY-MM-DD)
        due: NaiveDate,

        /// Return date (YYYY-MM-DD, default: today)
        returned: Option<NaiveDate>,
    },

    /// Books recommended for you
    Recommendations,

    /// Change your password
    Passwd,

    /// Administrator commands
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Dashboard counters
    Stats,

    /// List all users
    Users,

    /// List overdue loans
    Overdue,

    /// List all fines
    Fines {
        #[arg(long)]
        unpaid: bool,

        /// Only fines of this user
        #[arg(long)]
        user: Option<i64>,
    },

    /// Fine totals and policy
    FineStats,

    /// Waive a fine
    Waive { fine_id: i64 },

    /// Mark a reservation ready for pickup
    Ready { reservation_id: i64 },

    /// Turn a ready reservation into a loan
    Fulfill { reservation_id: i64 },

    /// Delete a book from the catalogue
    DeleteBook { id: i64 },

    /// Delete a user account
    DeleteUser { id: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_preview_dates() {
        let cli = Cli::try_parse_from(["libris", "preview", "2024-04-20", "2024-05-01"]).unwrap();
        match cli.command {
            Commands::Preview { due, returned } => {
                assert_eq!(due, NaiveDate::from_ymd_opt(2024, 4, 20).unwrap());
                assert_eq!(returned, NaiveDate::from_ymd_opt(2024, 5, 1));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_admin_subcommand_with_global_url() {
        let cli = Cli::try_parse_from([
            "libris",
            "admin",
            "fines",
            "--unpaid",
            "--api-url",
            "http://example.test/api",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://example.test/api"));
        assert!(matches!(
            cli.command,
            Commands::Admin(AdminCommands::Fines { unpaid: true, user: None })
        ));
    }
}
