use crate::infra::{in_memory_engine, InMemoryEngine};
use bistro::error::AppError;
use bistro::reputation::{
    AccountClosure, AccountId, AccountRecord, AccountRepository, AccountRole, DishId, EnginePolicy,
    FeedbackDecision, FeedbackSubmission, FeedbackTargetKind, InMemoryStore, MembershipTier,
    ReputationError,
};
use clap::Args;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Balance given to the customer whose third order should succeed.
    #[arg(long, default_value = "100")]
    pub(crate) opening_balance: Decimal,
    /// Skip the feedback portion of the demo.
    #[arg(long)]
    pub(crate) skip_feedback: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        opening_balance,
        skip_feedback,
    } = args;

    let store = Arc::new(InMemoryStore::default());
    let engine = in_memory_engine(store.clone(), EnginePolicy::default());

    println!("Bistro reputation demo");

    println!("\nCheckout with two prior orders and a 60.00 cart");
    let customers = [
        ("cust-short", Decimal::new(50, 0)),
        ("cust-ready", opening_balance),
    ];
    for (name, balance) in customers {
        let account = seed(&store, name, |record| {
            record.balance = balance;
            record.lifetime_order_count = 2;
        })?;
        for _ in 0..3 {
            engine
                .checkout_service()
                .add_to_cart(&account, &DishId("dish-ramen".to_string()))?;
        }

        match engine.checkout(&account) {
            Ok(order) => println!(
                "- {name}: paid order {} (subtotal {}, delivery {}, total {})",
                order.id, order.subtotal, order.delivery_fee, order.total
            ),
            Err(ReputationError::InsufficientBalance {
                required,
                available,
            }) => println!("- {name}: declined, needs {required} but holds {available}"),
            Err(err) => return Err(err.into()),
        }
        print_standing(&engine, &account)?;
    }

    println!("\nClosing both accounts");
    let closures = [
        ("cust-ready", AccountClosure::Quit),
        ("cust-short", AccountClosure::Kicked),
    ];
    for (name, closure) in closures {
        let receipt = engine.close_account(&AccountId(name.to_string()), closure)?;
        println!(
            "- {name}: {} (refunded {}, seized {})",
            closure.label(),
            receipt.refunded,
            receipt.seized
        );
    }

    if skip_feedback {
        return Ok(());
    }

    println!("\nComplaint against a VIP who already carries one warning");
    let driver = seed(&store, "driver-kai", |record| record.role = AccountRole::Driver)?;
    let vip = seed(&store, "cust-vip", |record| {
        record.tier = MembershipTier::Vip;
        record.warnings = 1;
    })?;
    let complaint = engine.file_feedback(submission(
        &driver,
        &vip,
        FeedbackTargetKind::Customer,
        false,
    ))?;
    println!("- filed {} with weight {}", complaint.id, complaint.weight);
    engine.resolve_feedback(&complaint.id, FeedbackDecision::Accept)?;
    print_standing(&engine, &vip)?;

    println!("\nCompliment cancelling an upheld complaint");
    let chef = seed(&store, "chef-ines", |record| record.role = AccountRole::Chef)?;
    let complaint =
        engine.file_feedback(submission(&driver, &chef, FeedbackTargetKind::Chef, false))?;
    engine.resolve_feedback(&complaint.id, FeedbackDecision::Accept)?;
    print_standing(&engine, &chef)?;
    let compliment =
        engine.file_feedback(submission(&driver, &chef, FeedbackTargetKind::Chef, true))?;
    let resolved = engine.resolve_feedback(&compliment.id, FeedbackDecision::Accept)?;
    println!(
        "- {} is now {} (paired with {})",
        resolved.id,
        resolved.status.label(),
        resolved
            .cancelled_with
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "nothing".to_string())
    );
    print_standing(&engine, &chef)?;

    Ok(())
}

fn seed(
    store: &InMemoryStore,
    id: &str,
    configure: impl FnOnce(&mut AccountRecord),
) -> Result<AccountId, AppError> {
    let mut record = AccountRecord::registered(AccountId(id.to_string()), AccountRole::Customer);
    configure(&mut record);
    let record = store
        .insert_account(record)
        .map_err(ReputationError::from)?;
    Ok(record.id)
}

fn submission(
    filer: &AccountId,
    target: &AccountId,
    target_kind: FeedbackTargetKind,
    is_compliment: bool,
) -> FeedbackSubmission {
    FeedbackSubmission {
        filer_id: filer.clone(),
        target_kind,
        target_id: target.clone(),
        message: if is_compliment {
            "Kind and on time".to_string()
        } else {
            "Rude at handoff".to_string()
        },
        is_compliment,
    }
}

fn print_standing(engine: &InMemoryEngine, account: &AccountId) -> Result<(), AppError> {
    let status = engine.account_status(account)?;
    println!(
        "  {} -> tier {} | warnings {} | blacklisted {} | balance {}",
        status.account_id, status.tier, status.warnings, status.blacklisted, status.balance
    );
    Ok(())
}
