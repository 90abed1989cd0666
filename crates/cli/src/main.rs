use anyhow::{bail, Context};
use bookstore_app::{
    modules::{
        accounts::{models::Account, store as accounts},
        books::{models::NewBook, store as books},
    },
    App,
};
use bookstore_authz::permission;
use bookstore_kernel::settings::Settings;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Bookstore administration
#[derive(Debug, Parser)]
#[command(name = "bookstore", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the web server
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Create an account with staff and superuser flags
    Createsuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Add a book to the catalog
    AddBook {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        /// Decimal price with at most two places, e.g. 25.00
        #[arg(long)]
        price: Decimal,
        /// Cover image reference
        #[arg(long)]
        cover: Option<String>,
    },
    /// Remove a book and its reviews
    DeleteBook {
        #[arg(long)]
        id: Uuid,
    },
    /// Replace an account's password
    Changepassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List every account with its flags and permissions
    ListAccounts,
    /// Grant a permission to an account
    Grant {
        #[arg(long)]
        email: String,
        #[arg(long)]
        permission: String,
    },
    /// Withdraw a permission from an account
    Revoke {
        #[arg(long)]
        email: String,
        #[arg(long)]
        permission: String,
    },
    /// Disable an account and end its sessions
    Deactivate {
        #[arg(long)]
        email: String,
    },
    /// Delete an account with its reviews, sessions and grants
    DeleteAccount {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookstore settings")?;
    bookstore_telemetry::init(&settings.telemetry)?;

    let app = App::bootstrap(settings).await?;
    run(&app, cli.command).await
}

async fn run(app: &App, command: Command) -> anyhow::Result<()> {
    let db = &app.state.db;

    match command {
        Command::Serve => app.serve().await?,
        Command::Migrate => {
            tracing::info!("migrations applied");
            println!("database schema is up to date");
        }
        Command::Createsuperuser {
            username,
            email,
            password,
        } => {
            let account = accounts::create_superuser(db, &username, &email, &password).await?;
            println!("superuser '{}' created (id {})", account.username, account.id);
        }
        Command::Changepassword { email, password } => {
            let account = account_by_email(app, &email).await?;
            accounts::set_password(db, account.id, &password).await?;
            let ended = app.state.sessions.revoke_all(account.id).await?;
            tracing::info!(account_id = account.id, sessions = ended, "password changed");
            println!("password changed for {}", account.email);
        }
        Command::ListAccounts => {
            for account in accounts::list(db).await? {
                let grants = permission::granted(db, account.id).await?;
                println!(
                    "{}\t{}\t{}\tactive={} staff={} superuser={}\t[{}]",
                    account.id,
                    account.username,
                    account.email,
                    account.is_active,
                    account.is_staff,
                    account.is_superuser,
                    grants.join(", ")
                );
            }
        }
        Command::AddBook {
            title,
            author,
            price,
            cover,
        } => {
            let book = books::create(
                db,
                NewBook {
                    title,
                    author,
                    price,
                    cover,
                },
            )
            .await?;
            println!("{} {}", book.id, book.title);
        }
        Command::DeleteBook { id } => {
            if !books::delete(db, id).await? {
                bail!("no book with id {id}");
            }
            println!("book {id} deleted");
        }
        Command::Grant { email, permission } => {
            let account = account_by_email(app, &email).await?;
            permission::grant(db, account.id, &permission).await?;
            println!("granted '{permission}' to {}", account.email);
            print_grants(app, &account).await?;
        }
        Command::Revoke { email, permission } => {
            let account = account_by_email(app, &email).await?;
            if permission::revoke(db, account.id, &permission).await? {
                println!("revoked '{permission}' from {}", account.email);
            } else {
                println!("{} did not hold '{permission}'", account.email);
            }
            print_grants(app, &account).await?;
        }
        Command::Deactivate { email } => {
            let account = account_by_email(app, &email).await?;
            accounts::set_active(db, account.id, false).await?;
            let ended = app.state.sessions.revoke_all(account.id).await?;
            tracing::info!(account_id = account.id, sessions = ended, "account deactivated");
            println!("{} deactivated", account.email);
        }
        Command::DeleteAccount { email } => {
            let account = account_by_email(app, &email).await?;
            let reviews = books::reviews_by(db, account.id).await?;
            accounts::delete(db, account.id).await?;
            println!("{} deleted with {} review(s)", account.email, reviews.len());
        }
    }

    Ok(())
}

async fn account_by_email(app: &App, email: &str) -> anyhow::Result<Account> {
    accounts::find_by_email(&app.state.db, email)
        .await?
        .with_context(|| format!("no account with email '{email}'"))
}

async fn print_grants(app: &App, account: &Account) -> anyhow::Result<()> {
    let grants = permission::granted(&app.state.db, account.id).await?;
    if grants.is_empty() {
        println!("{} holds no permissions", account.email);
    } else {
        println!("{} holds: {}", account.email, grants.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_kernel::settings::DatabaseSettings;
    use clap::CommandFactory;

    async fn app() -> App {
        let settings = Settings {
            database: DatabaseSettings::in_memory(),
            ..Settings::default()
        };
        App::bootstrap(settings).await.unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_book() {
        let cli = Cli::try_parse_from([
            "bookstore",
            "add-book",
            "--title",
            "Harry Potter",
            "--author",
            "JK Rowling",
            "--price",
            "25.00",
        ])
        .unwrap();

        match cli.command {
            Command::AddBook {
                title,
                author,
                price,
                cover,
            } => {
                assert_eq!(title, "Harry Potter");
                assert_eq!(author, "JK Rowling");
                assert_eq!(price.to_string(), "25.00");
                assert!(cover.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(Cli::try_parse_from(["bookstore", "delete-book", "--id", "12345"]).is_err());
        assert!(Cli::try_parse_from([
            "bookstore",
            "add-book",
            "--title",
            "t",
            "--author",
            "a",
            "--price",
            "cheap",
        ])
        .is_err());
    }

    #[test]
    fn grant_requires_both_flags() {
        assert!(Cli::try_parse_from(["bookstore", "grant", "--email", "a@b.com"]).is_err());
        let cli = Cli::try_parse_from([
            "bookstore",
            "grant",
            "--email",
            "a@b.com",
            "--permission",
            "special_status",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Grant { .. }));
    }

    #[tokio::test]
    async fn changepassword_replaces_credential() {
        let app = app().await;
        accounts::create_user(&app.state.db, "reader", "reader@email.com", None)
            .await
            .unwrap();

        run(
            &app,
            Command::Changepassword {
                email: "Reader@email.com".to_string(),
                password: "newpass123".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(accounts::authenticate(&app.state.db, "reader@email.com", "newpass123")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn grant_and_revoke_update_permissions() {
        let app = app().await;
        let db = &app.state.db;
        let user = accounts::create_user(db, "reader", "reader@email.com", None)
            .await
            .unwrap();

        let grant = |permission: &str| Command::Grant {
            email: "reader@email.com".to_string(),
            permission: permission.to_string(),
        };
        run(&app, grant("special_status")).await.unwrap();
        assert_eq!(
            permission::granted(db, user.id).await.unwrap(),
            vec!["special_status".to_string()]
        );
        assert!(run(&app, grant("no_such_permission")).await.is_err());

        run(
            &app,
            Command::Revoke {
                email: "reader@email.com".to_string(),
                permission: "special_status".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(permission::granted(db, user.id).await.unwrap().is_empty());

        run(&app, Command::ListAccounts).await.unwrap();
    }

    #[tokio::test]
    async fn delete_account_removes_reviews() {
        let app = app().await;
        let db = &app.state.db;
        let user = accounts::create_user(db, "reader", "reader@email.com", None)
            .await
            .unwrap();
        let book = books::create(
            db,
            NewBook {
                title: "Harry Potter".to_string(),
                author: "JK Rowling".to_string(),
                price: "25.00".parse().unwrap(),
                cover: None,
            },
        )
        .await
        .unwrap();
        books::add_review(db, book.id, user.id, "An excellent review")
            .await
            .unwrap();

        run(
            &app,
            Command::DeleteAccount {
                email: "reader@email.com".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(books::reviews_by(db, user.id).await.unwrap().is_empty());
        assert!(books::reviews(db, book.id).await.unwrap().is_empty());
    }
}
