//! Phone verification commands.

use anyhow::Result;
use omni_core::omni_auth::DeliveryInstruction;

use super::{OtpArgs, OtpCommand};
use crate::context::Context;

/// Run the otp command.
pub async fn run(args: OtpArgs, ctx: &Context) -> Result<()> {
    let shopper = ctx.shopper().await?;

    match args.command {
        OtpCommand::Send { phone } => {
            let instruction = shopper.send_otp(&phone).await?;
            report_issued(&instruction, ctx);
        }
        OtpCommand::Resend { phone } => {
            let instruction = shopper.resend_otp(&phone).await?;
            report_issued(&instruction, ctx);
        }
        OtpCommand::Verify { phone, code } => {
            let record = shopper.verify_otp(&phone, &code).await?;
            if ctx.output.is_json() {
                ctx.output.json(&record);
            } else {
                ctx.output.success("Phone verified. Browsing unlocked.");
            }
        }
    }

    Ok(())
}

fn report_issued(instruction: &DeliveryInstruction, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(instruction);
        return;
    }

    ctx.output
        .success(&format!("Code sent to {}", instruction.phone.masked()));
    if let Some(code) = &instruction.code {
        ctx.output.kv("code (local mode)", code);
    }
    ctx.output.kv(
        "expires",
        &instruction
            .expires_at
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S")
            .to_string(),
    );
}
