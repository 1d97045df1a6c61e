use std::collections::BTreeSet;

use clap::Args;
use mindgarden_core::{ActionCategory, CustomizationRequest, GestureKind};

use super::{print_json, CmdResult, Context};

#[derive(Args)]
pub struct CustomizeArgs {
    #[arg(long)]
    pub background: Option<String>,
    #[arg(long)]
    pub plant_skin: Option<String>,
    /// Decor id; repeat for several. Replaces the current decor.
    #[arg(long)]
    pub decor: Vec<String>,
    /// Remove all decor
    #[arg(long, conflicts_with = "decor")]
    pub clear_decor: bool,
}

pub fn show(ctx: &Context) -> CmdResult {
    let service = ctx.service()?;
    print_json(&service.garden(&ctx.user, ctx.now())?)
}

pub fn insights(ctx: &Context) -> CmdResult {
    let service = ctx.service()?;
    print_json(&service.insights(&ctx.user, ctx.now())?)
}

pub fn prefs(ctx: &Context, raw: &[String]) -> CmdResult {
    let categories = raw
        .iter()
        .map(|name| name.parse::<ActionCategory>())
        .collect::<Result<BTreeSet<_>, _>>()?;
    let service = ctx.service()?;
    let garden = service.set_preferences(&ctx.user, &categories, ctx.now())?;
    print_json(&garden.preferred_categories)
}

pub fn customize(ctx: &Context, args: CustomizeArgs) -> CmdResult {
    let decor = if args.clear_decor {
        Some(Vec::new())
    } else if args.decor.is_empty() {
        None
    } else {
        Some(args.decor)
    };
    let request = CustomizationRequest {
        background: args.background,
        plant_skin: args.plant_skin,
        decor,
    };
    let service = ctx.service()?;
    print_json(&service.customize(&ctx.user, &request, ctx.now())?)
}

pub fn gesture(ctx: &Context, friend_code: &str, gesture: &str) -> CmdResult {
    let gesture =
        GestureKind::from_name(gesture).ok_or_else(|| format!("unknown gesture '{gesture}'"))?;
    let service = ctx.service()?;
    print_json(&service.send_gesture(&ctx.user, friend_code, gesture, ctx.now())?)
}
