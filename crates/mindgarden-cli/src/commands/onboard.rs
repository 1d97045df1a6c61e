use clap::Args;
use mindgarden_core::{OnboardingRequest, SeedType};

use super::{print_json, CmdResult, Context};

#[derive(Args)]
pub struct OnboardArgs {
    /// Calm, Focus, Resilience or Gratitude
    #[arg(long)]
    pub seed_type: SeedType,
    /// Seed look (random when omitted)
    #[arg(long)]
    pub variant: Option<String>,
    /// Daily reminder, HH:MM
    #[arg(long)]
    pub reminder: Option<String>,
    /// IANA timezone, e.g. Europe/Berlin
    #[arg(long)]
    pub timezone: Option<String>,
}

pub fn run(ctx: &Context, args: OnboardArgs) -> CmdResult {
    let service = ctx.service()?;
    let request = OnboardingRequest {
        user_id: ctx.user.clone(),
        seed_type: args.seed_type,
        seed_variant: args.variant,
        reminder_time: args.reminder,
        timezone: args.timezone,
    };
    let profile = service.onboard(&request, &mut ctx.rng())?;
    print_json(&profile)
}
