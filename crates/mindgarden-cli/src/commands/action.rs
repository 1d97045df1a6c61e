use clap::Args;
use mindgarden_core::{ActionKind, ActionResponse, CompletionSubmission};

use super::{print_json, CmdResult, Context};

#[derive(Args)]
pub struct CompleteArgs {
    /// Action type, e.g. breath or body_scan
    pub action_type: String,
    /// core or bonus
    #[arg(long, default_value = "core")]
    pub kind: ActionKind,
    /// Variant shown with the action
    #[arg(long)]
    pub variant: Option<String>,
    /// Mood score 1-5
    #[arg(long)]
    pub mood: Option<u8>,
    /// Free-text answer
    #[arg(long)]
    pub text: Option<String>,
    /// Body-scan sensation (give three)
    #[arg(long = "sensation")]
    pub sensations: Vec<String>,
    /// Reframe: what is stressing you
    #[arg(long, requires = "shift")]
    pub stress: Option<String>,
    /// Reframe: the kinder view
    #[arg(long, requires = "stress")]
    pub shift: Option<String>,
}

impl CompleteArgs {
    fn response(&self) -> Result<ActionResponse, String> {
        if let Some(score) = self.mood {
            return Ok(ActionResponse::Mood { score });
        }
        if !self.sensations.is_empty() {
            let sensations: [String; 3] = self
                .sensations
                .clone()
                .try_into()
                .map_err(|_| "expected exactly three --sensation values".to_string())?;
            return Ok(ActionResponse::BodyScan { sensations });
        }
        if let (Some(stress), Some(shift)) = (&self.stress, &self.shift) {
            return Ok(ActionResponse::Reframe {
                stress: stress.clone(),
                shift: shift.clone(),
            });
        }
        Ok(match &self.text {
            Some(text) => ActionResponse::Text { text: text.clone() },
            None => ActionResponse::Empty,
        })
    }
}

pub fn today(ctx: &Context, swap: bool) -> CmdResult {
    let service = ctx.service()?;
    let plan = service.today(&ctx.user, ctx.now(), swap, &mut ctx.rng())?;
    print_json(&plan)
}

pub fn complete(ctx: &Context, args: CompleteArgs) -> CmdResult {
    let service = ctx.service()?;
    let mut submission =
        CompletionSubmission::new(args.action_type.clone(), args.kind).with_response(args.response()?);
    if let Some(variant) = &args.variant {
        submission = submission.with_variant(variant.clone());
    }
    let outcome = service.complete(&ctx.user, &submission, ctx.now())?;
    print_json(&outcome)
}
