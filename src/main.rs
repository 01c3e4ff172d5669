use dotenvy::dotenv;
use split_buddy::{
    config::{database, ledger},
    core::{
        balance::group_balances,
        expense::{NewExpense, record_expense},
        group::{get_group_by_id, get_group_members},
        member::seed_members,
        model::{ExpenseCategory, GroupId, MemberId},
        money::Money,
        report::{format_balance_lines, format_debt, format_money, format_payment, member_names},
    },
    errors::{Error, Result},
    store::SeaOrmStore,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "Usage: split-buddy <group-id> [add <payer-id> <amount> <description...>]";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load the ledger configuration
    let config = ledger::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure the tables exist
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    seed_members(&db, &config)
        .await
        .inspect(|created| info!("Member seeding done, {created} new member(s)."))
        .inspect_err(|e| error!("Failed to seed members: {}", e))?;

    // 5. Report on the requested group
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(arg) = args.first() else {
        info!("No group id given, nothing to report. {USAGE}");
        return Ok(());
    };
    let group_id = GroupId(parse_id("group id", arg)?);

    let group = get_group_by_id(&db, group_id)
        .await?
        .ok_or(Error::GroupNotFound { group: group_id })?;

    // 6. Optionally record an equally split expense first
    match args.get(1).map(String::as_str) {
        None => {}
        Some("add") => {
            let [payer, amount, description @ ..] = &args[2..] else {
                return Err(Error::Config {
                    message: format!("Missing payer or amount. {USAGE}"),
                });
            };
            let participants: Vec<MemberId> = get_group_members(&db, group_id)
                .await?
                .into_iter()
                .map(|member| member.id)
                .collect();

            let recorded = record_expense(
                &db,
                NewExpense {
                    group_id,
                    paid_by: MemberId(parse_id("payer id", payer)?),
                    amount: Money::parse(amount, config.currency.minor_unit_digits)?,
                    currency: config.currency.code.clone(),
                    description: description.join(" "),
                    category: ExpenseCategory::Other,
                    participants,
                    weights: None,
                },
            )
            .await
            .inspect_err(|e| error!("Failed to record expense: {}", e))?;

            println!(
                "Recorded {:?} for {}, split {} ways",
                recorded.expense.description,
                format_money(recorded.expense.amount, &config.currency),
                recorded.splits.len()
            );
            println!();
        }
        Some(other) => {
            return Err(Error::Config {
                message: format!("Unknown command {other:?}. {USAGE}"),
            });
        }
    }

    let store = SeaOrmStore::new(db);
    let balances = group_balances(&store, group_id)
        .await
        .inspect_err(|e| error!("Failed to compute balances: {}", e))?;

    let names = member_names(&balances.members);
    let currency = &config.currency;

    println!("{} ({} members)", group.name, balances.members.len());
    println!();
    println!("Balances:");
    for line in format_balance_lines(&balances.ledger, &names, currency) {
        println!("  {line}");
    }

    println!();
    println!("Outstanding debts:");
    for debt in balances.ledger.debts() {
        println!("  {}", format_debt(&debt, &names, currency));
    }

    println!();
    println!("Suggested payments:");
    if balances.settlement.is_empty() {
        println!("  Everyone is settled up");
    }
    for payment in &balances.settlement {
        println!("  {}", format_payment(payment, &names, currency));
    }

    Ok(())
}

fn parse_id(what: &str, value: &str) -> Result<i64> {
    value.parse::<i64>().map_err(|e| Error::Config {
        message: format!("Invalid {what} {value:?}: {e}"),
    })
}
