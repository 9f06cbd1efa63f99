use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fp_schemas::{OrderStatus, PaymentStatus, UserRole};
use uuid::Uuid;

mod commands;

use commands::{orders, reports, users};

#[derive(Parser)]
#[command(name = "fp")]
#[command(about = "FlashPrint operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Accounts and roles
    User {
        #[command(subcommand)]
        cmd: UserCmd,
    },

    /// Bearer tokens for the storefront and admin panel
    Session {
        #[command(subcommand)]
        cmd: SessionCmd,
    },

    /// Inspect and move orders
    Order {
        #[command(subcommand)]
        cmd: OrderCmd,
    },

    /// Daily expenses that feed the profit report
    Expense {
        #[command(subcommand)]
        cmd: ExpenseCmd,
    },

    /// Daily sales report and workbook exports
    Report {
        #[command(subcommand)]
        cmd: ReportCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply SQL migrations. Guardrail: refuses while orders are printing or out for delivery unless --yes is provided.
    Migrate {
        /// Acknowledge you are migrating a DB the shop is actively working from.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum UserCmd {
    /// Create a user by email (existing users are left unchanged)
    Add {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: Option<String>,

        /// STUDENT | FACULTY | OTHERS | ADMIN
        #[arg(long, default_value = "STUDENT", value_parser = parse_role)]
        role: UserRole,
    },

    /// Make an existing user an ADMIN
    Promote {
        #[arg(long)]
        email: String,
    },

    /// Newest users first
    List {
        #[arg(long, value_parser = parse_role)]
        role: Option<UserRole>,

        /// Matches name, email or phone
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

#[derive(Subcommand)]
enum SessionCmd {
    /// Issue a bearer token for a user and print it once
    Issue {
        #[arg(long)]
        email: String,

        /// Token lifetime in hours
        #[arg(long, default_value_t = 720)]
        ttl_hours: i64,
    },

    /// Revoke one token, or every token of a user
    Revoke {
        #[arg(long, conflicts_with = "email", required_unless_present = "email")]
        token: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Subcommand)]
enum OrderCmd {
    /// Print an order with its items and status history
    Show {
        /// Order number (FP...)
        #[arg(long)]
        number: String,
    },

    /// Set the order status as an admin would
    SetStatus {
        #[arg(long)]
        number: String,

        /// PENDING | PAYMENT_CONFIRMED | PRINTING | READY_FOR_DELIVERY | OUT_FOR_DELIVERY | DELIVERED | CANCELLED
        #[arg(long, value_parser = parse_order_status)]
        status: OrderStatus,

        #[arg(long)]
        note: Option<String>,
    },

    /// Record a payment outcome
    SetPayment {
        #[arg(long)]
        number: String,

        /// PENDING | COMPLETED | FAILED
        #[arg(long, value_parser = parse_payment_status)]
        status: PaymentStatus,

        /// UPI transaction reference
        #[arg(long)]
        payment_id: Option<String>,
    },
}

#[derive(Subcommand)]
enum ExpenseCmd {
    Add {
        /// Calendar day (YYYY-MM-DD); defaults to today in the shop's timezone
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        category: String,

        /// Rupees, e.g. 250 or 250.50
        #[arg(long)]
        amount: String,

        #[arg(long)]
        description: Option<String>,

        /// Recorded as the creator
        #[arg(long)]
        by: Option<String>,
    },

    Remove {
        #[arg(long)]
        id: Uuid,
    },

    List {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum ReportCmd {
    /// Print the day's totals without writing anything
    Show {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Regenerate the day's workbook (and optionally an orders CSV)
    Export {
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Also write the order lines as CSV to this path
        #[arg(long)]
        csv: Option<String>,
    },

    /// List workbooks in the exports directory, newest first
    List,
}

fn parse_role(s: &str) -> Result<UserRole, String> {
    UserRole::parse(&s.trim().to_ascii_uppercase()).map_err(|e| e.to_string())
}

fn parse_order_status(s: &str) -> Result<OrderStatus, String> {
    OrderStatus::parse(&s.trim().to_ascii_uppercase()).map_err(|e| e.to_string())
}

fn parse_payment_status(s: &str) -> Result<PaymentStatus, String> {
    PaymentStatus::parse(&s.trim().to_ascii_uppercase()).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = fp_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => {
                    let s = fp_db::status(&pool).await?;
                    println!("db_ok={} has_orders_table={}", s.ok, s.has_orders_table);
                }
                DbCmd::Migrate { yes } => {
                    // A fresh database has nothing in flight.
                    let s = fp_db::status(&pool).await?;
                    if s.has_orders_table {
                        let n = fp_db::count_in_flight_orders(&pool).await?;
                        if n > 0 && !yes {
                            anyhow::bail!(
                                "REFUSING MIGRATE: {} order(s) are printing or out for delivery. Re-run with: `fp db migrate --yes`",
                                n
                            );
                        }
                    }

                    fp_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = fp_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::User { cmd } => match cmd {
            UserCmd::Add { email, name, role } => {
                users::user_add(&email, name.as_deref(), role).await?
            }
            UserCmd::Promote { email } => users::user_promote(&email).await?,
            UserCmd::List {
                role,
                search,
                limit,
            } => users::user_list(role, search, limit).await?,
        },

        Commands::Session { cmd } => match cmd {
            SessionCmd::Issue { email, ttl_hours } => {
                users::session_issue(&email, ttl_hours).await?
            }
            SessionCmd::Revoke { token, email } => {
                users::session_revoke(token.as_deref(), email.as_deref()).await?
            }
        },

        Commands::Order { cmd } => match cmd {
            OrderCmd::Show { number } => orders::order_show(&number).await?,
            OrderCmd::SetStatus {
                number,
                status,
                note,
            } => orders::order_set_status(&number, status, note).await?,
            OrderCmd::SetPayment {
                number,
                status,
                payment_id,
            } => orders::order_set_payment(&number, status, payment_id).await?,
        },

        Commands::Expense { cmd } => match cmd {
            ExpenseCmd::Add {
                date,
                category,
                amount,
                description,
                by,
            } => reports::expense_add(date, category, &amount, description, by).await?,
            ExpenseCmd::Remove { id } => reports::expense_remove(id).await?,
            ExpenseCmd::List { date } => reports::expense_list(date).await?,
        },

        Commands::Report { cmd } => match cmd {
            ReportCmd::Show { date } => reports::report_show(date).await?,
            ReportCmd::Export { date, csv } => reports::report_export(date, csv).await?,
            ReportCmd::List => reports::report_list()?,
        },
    }

    Ok(())
}

/// Logs go to stderr; stdout carries only `key=value` output.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
