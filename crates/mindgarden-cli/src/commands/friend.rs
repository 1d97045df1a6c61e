use clap::Subcommand;

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum FriendAction {
    /// Befriend the owner of a garden code
    Add {
        friend_code: String,
    },
    /// List friends, oldest first
    List,
    /// Gestures received from friends, most recent first
    Gestures,
}

pub fn run(ctx: &Context, action: FriendAction) -> CmdResult {
    let service = ctx.service()?;
    match action {
        FriendAction::Add { friend_code } => {
            print_json(&service.add_friend(&ctx.user, &friend_code, ctx.now())?)
        }
        FriendAction::List => print_json(&service.friends(&ctx.user)?),
        FriendAction::Gestures => print_json(&service.received_gestures(&ctx.user)?),
    }
}
