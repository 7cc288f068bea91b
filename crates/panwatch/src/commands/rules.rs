//! Security rule command handlers.

use tabled::Tabled;

use panwatch_core::entity::RuleSwitch;
use panwatch_core::{CommandResult, CommitOutcome, Controller, SecurityRule};

use crate::cli::{GlobalOpts, RulesArgs, RulesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Rule table row ──────────────────────────────────────────────────

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Application")]
    application: String,
    #[tabled(rename = "Service")]
    service: String,
}

impl RuleRow {
    fn new(rule: &SecurityRule, color: bool) -> Self {
        Self {
            name: rule.name.clone(),
            enabled: output::yes_no(rule.is_enabled(), color),
            action: rule.action.to_string(),
            from: members(&rule.from_zones),
            to: members(&rule.to_zones),
            application: members(&rule.application),
            service: members(&rule.service),
        }
    }
}

fn members(list: &[String]) -> String {
    if list.is_empty() {
        "-".into()
    } else {
        list.join(", ")
    }
}

fn rule_detail(rule: &SecurityRule, unique_id: &str) -> String {
    [
        format!("Name:        {}", rule.name),
        format!("UUID:        {}", rule.uuid.as_deref().unwrap_or("-")),
        format!("Enabled:     {}", rule.is_enabled()),
        format!("Action:      {}", rule.action),
        format!("From:        {}", members(&rule.from_zones)),
        format!("To:          {}", members(&rule.to_zones)),
        format!("Source:      {}", members(&rule.source)),
        format!("Destination: {}", members(&rule.destination)),
        format!("Application: {}", members(&rule.application)),
        format!("Service:     {}", members(&rule.service)),
        format!("Tags:        {}", members(&rule.tags)),
        format!("Description: {}", rule.description.as_deref().unwrap_or("-")),
        format!("Switch ID:   {unique_id}"),
    ]
    .join("\n")
}

fn commit_summary(outcome: &CommitOutcome) -> String {
    match outcome {
        CommitOutcome::NoChanges => "nothing to commit".into(),
        CommitOutcome::Queued { job_id } => format!("commit job {job_id} queued"),
        CommitOutcome::Completed { job_id, .. } => format!("commit job {job_id} completed"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: RulesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        RulesCommand::List { disabled, enabled } => {
            let snap = controller.snapshot();
            let rules: Vec<SecurityRule> = snap
                .rules
                .values()
                .filter(|r| !(disabled && r.is_enabled()) && !(enabled && r.disabled))
                .cloned()
                .collect();
            let out = output::render_list(
                &global.output,
                &rules,
                |r| RuleRow::new(r, color),
                |r| r.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RulesCommand::Get { name } => {
            let identity = util::identity(controller)?;
            let snap = controller.snapshot();
            let rule = snap
                .rule(&name)
                .ok_or_else(|| CliError::RuleNotFound { name: name.clone() })?;
            let switch = RuleSwitch::new(name, identity.serial);
            let out = output::render_single(
                &global.output,
                rule,
                |r| rule_detail(r, &switch.unique_id()),
                |r| r.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RulesCommand::Enable { name } => set_enabled(controller, name, true, global).await,

        RulesCommand::Disable { name } => set_enabled(controller, name, false, global).await,
    }
}

async fn set_enabled(
    controller: &Controller,
    name: String,
    enable: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let identity = util::identity(controller)?;
    // Fail before prompting if the rule is unknown.
    if controller.snapshot().rule(&name).is_none() {
        return Err(CliError::RuleNotFound { name });
    }

    let verb = if enable { "Enable" } else { "Disable" };
    if !util::confirm(
        &format!("{verb} rule '{name}' and commit the candidate configuration?"),
        global.yes,
    )? {
        return Ok(());
    }

    let switch = RuleSwitch::new(name.clone(), identity.serial);
    let result = if enable {
        switch.turn_on(controller).await?
    } else {
        switch.turn_off(controller).await?
    };

    if let CommandResult::RuleUpdated { commit, snapshot } = result {
        tracing::debug!(rule = %name, on = switch.is_on(&snapshot), "rule state after refresh");
        if !global.quiet {
            let state = if enable { "enabled" } else { "disabled" };
            eprintln!("Rule '{name}' {state} ({})", commit_summary(&commit));
        }
    }
    Ok(())
}
