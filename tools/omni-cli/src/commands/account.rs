//! Account commands.

use anyhow::{bail, Result};

use super::{AccountArgs, AccountCommand};
use crate::context::Context;

/// Run the account command.
pub async fn run(args: AccountArgs, ctx: &Context) -> Result<()> {
    let shopper = ctx.shopper().await?;

    match args.command {
        AccountCommand::Register {
            name,
            email,
            password,
        } => {
            let user = shopper.register(&name, &email, &password).await?;
            if ctx.output.is_json() {
                ctx.output.json(&user);
            } else {
                ctx.output
                    .success(&format!("Welcome, {}! You are logged in.", user.name));
            }
        }
        AccountCommand::Login { email, password } => {
            let user = shopper.login(&email, &password).await?;
            if ctx.output.is_json() {
                ctx.output.json(&user);
            } else {
                ctx.output.success(&format!("Logged in as {}", user.email));
            }
        }
        AccountCommand::Logout => {
            let record = shopper.logout().await?;
            if ctx.output.is_json() {
                ctx.output.json(&record);
            } else {
                ctx.output.success("Logged out.");
            }
        }
        AccountCommand::Whoami => {
            let record = shopper.record().await?;
            if ctx.output.is_json() {
                ctx.output.json(&record);
                return Ok(());
            }

            ctx.output.header("Session");
            ctx.output.kv("id", shopper.id().as_str());
            ctx.output.kv("state", record.state().as_str());
            if let Some(phone) = &record.phone {
                ctx.output.kv("phone", &phone.masked());
            }
            match &record.user {
                Some(user) => {
                    ctx.output.kv("user", &format!("{} <{}>", user.name, user.email));
                    ctx.output.kv("role", user.role.as_str());
                }
                None => ctx.output.kv("user", "(not logged in)"),
            }
        }
        AccountCommand::Customers => {
            match shopper.current_user().await? {
                Some(user) if user.is_admin() => {}
                _ => bail!("Only an admin can list customers"),
            }

            let customers = ctx.store.customers().await?;
            if ctx.output.is_json() {
                ctx.output.json(&customers);
                return Ok(());
            }

            ctx.output.header("Customers");
            for user in &customers {
                ctx.output.table_row(
                    &[
                        &user.name,
                        &user.email,
                        user.role.as_str(),
                        &user.registered_at.format("%d/%m/%Y").to_string(),
                    ],
                    &[16, 28, 9, 0],
                );
            }
        }
    }

    Ok(())
}
