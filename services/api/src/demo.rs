use crate::infra::{InMemoryLedger, OfflineExplainer};
use clap::Args;
use fraudguard::config::RulesConfig;
use fraudguard::error::AppError;
use fraudguard::screening::{ChargeScreeningService, ChargeSubmission, PaymentChannel};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional rule file (JSON). Defaults to the built-in ruleset.
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
}

fn sample_charge(
    amount: Decimal,
    currency: &str,
    source: PaymentChannel,
    email: &str,
) -> ChargeSubmission {
    ChargeSubmission {
        amount,
        currency: currency.to_string(),
        source,
        email: email.to_string(),
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let ruleset = crate::server::load_ruleset(&RulesConfig { path: args.rules })?;
    let ledger = Arc::new(InMemoryLedger::default());
    let service = ChargeScreeningService::new(ruleset, OfflineExplainer, ledger);

    println!("Charge screening demo (offline explainer)");

    let charges = [
        ("routine charge", sample_charge(dec!(120), "USD", PaymentChannel::Stripe, "alice@example.com")),
        ("high amount", sample_charge(dec!(6000), "USD", PaymentChannel::Stripe, "bob@example.com")),
        ("very high amount", sample_charge(dec!(12000), "USD", PaymentChannel::Paypal, "carol@example.com")),
        ("everything wrong", sample_charge(dec!(20000), "XYZ", PaymentChannel::Other, "mallory@temp.com")),
        // Same risk profile as "high amount": served from the cache.
        ("high amount again", sample_charge(dec!(8500), "USD", PaymentChannel::BankTransfer, "dave@example.com")),
    ];

    for (name, submission) in charges {
        println!("\n{name}: {} {}", submission.amount, submission.currency);
        match service.assess(submission).await {
            Ok(assessment) => {
                println!(
                    "  decision: {} (score {})",
                    assessment.decision.label(),
                    assessment.score
                );
                if assessment.triggered_rule_ids.is_empty() {
                    println!("  signals: none");
                } else {
                    println!("  signals: {}", assessment.triggered_rule_ids.join(", "));
                }
                println!("  explanation: {}", assessment.explanation);
            }
            Err(err) => println!("  rejected: {err}"),
        }
    }

    let stats = service.cache_stats();
    println!("\nExplanation cache: {} entries ({})", stats.size, stats.status);

    let records = service.recent_charges(10)?;
    println!("Ledger entries (newest first):");
    for record in records {
        println!(
            "  {} | {} {} | {} | score {}",
            record.recorded_at.format("%H:%M:%S"),
            record.context.amount,
            record.context.currency,
            record.decision.label(),
            record.score
        );
    }

    Ok(())
}
