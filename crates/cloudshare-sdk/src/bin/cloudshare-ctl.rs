// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! CloudShare Control CLI
//!
//! Usage:
//!   cloudshare-ctl [global options] <command> [options]
//!
//! Environments:
//!   env-show-all | env-status | env-get-info | env-get-vms-info | env-create
//!   env-suspend | env-resume | env-delete
//!
//! Catalog:
//!   blueprint-list | policy-list
//!
//! Classes:
//!   class-show-all | class-get | class-list | class-create | class-clone
//!   class-setstatus | class-delete | class-delete-expired
//!
//! Files:
//!   json-merge <base> <overrides>
//!
//! Exit codes: 0 success, 1 error, 2 lifecycle wait timed out.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::{error, info};

use cloudshare_sdk::{
    ClassMatcher, ClassStatus, CloudShareSdk, CreateClassOptions, CreateEnvironmentOptions,
    DEFAULT_TABLE_WIDTH, LIFECYCLE_DELAY, LIFECYCLE_MAX_ATTEMPTS, LifecycleOperation,
    OutputFormat, PollPolicy, Record, RenderOptions, SdkConfig, SdkError, ThreadSleeper,
    available_fields, init_logging, into_value, merge_json_files, project_fields, render,
};

#[derive(Debug, Parser)]
#[command(name = "cloudshare-ctl")]
#[command(about = "Automate CloudShare environments, classes and lifecycle waits")]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Json)]
    outformat: OutputFormat,

    /// Maximum table width in columns
    #[arg(long, short = 'w', global = true, default_value_t = DEFAULT_TABLE_WIDTH)]
    tablewidth: u16,

    /// Dotenv file with CLOUDSHARE_API_ID and CLOUDSHARE_API_KEY
    #[arg(long, short = 'k', global = true)]
    keyfile: Option<PathBuf>,

    /// Log level (ERROR, WARN, INFO, DEBUG, TRACE)
    #[arg(long, global = true, default_value = "INFO")]
    loglevel: String,

    /// Append full log lines to this file
    #[arg(long, global = true)]
    logfile: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Field selection shared by listing commands.
#[derive(Debug, Args)]
struct FieldArgs {
    /// Attribute to show (repeat for multiple attributes)
    #[arg(long)]
    field: Vec<String>,

    /// Show all available attributes
    #[arg(long)]
    availfields: bool,
}

/// Poll budget for lifecycle commands.
#[derive(Debug, Args)]
struct WaitArgs {
    /// Seconds between status polls
    #[arg(long, default_value_t = LIFECYCLE_DELAY.as_secs())]
    delay: u64,

    /// Polls before giving up
    #[arg(long, default_value_t = LIFECYCLE_MAX_ATTEMPTS, value_parser = parse_attempts)]
    max_attempts: u32,
}

impl WaitArgs {
    fn policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(self.delay), self.max_attempts)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Api(ApiCommand),

    /// Replace attributes of BASE that also exist in OVERRIDES
    JsonMerge { base: PathBuf, overrides: PathBuf },
}

/// Commands that talk to the CloudShare API and need credentials.
#[derive(Debug, Subcommand)]
enum ApiCommand {
    /// Show all environments with their status
    EnvShowAll,

    /// Show the status text of an environment
    EnvStatus {
        /// Environment Id
        #[arg(long, alias = "env-id")]
        envid: String,
    },

    /// Show info for an environment
    EnvGetInfo {
        /// Environment Id
        #[arg(long, alias = "env-id")]
        envid: String,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Show all VMs info for an environment
    EnvGetVmsInfo {
        /// Environment Id
        #[arg(long, alias = "env-id")]
        envid: String,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Create one or more environments from a blueprint
    EnvCreate {
        /// Blueprint ID to create environment from
        #[arg(long)]
        blueprint_id: String,
        /// Policy ID to use
        #[arg(long)]
        policy_id: Option<String>,
        /// Name for the new environment
        #[arg(long)]
        name: Option<String>,
        /// Description for the new environment
        #[arg(long)]
        description: Option<String>,
        /// Number of environments to create
        #[arg(long, default_value_t = 1, value_parser = parse_count)]
        count: u32,
    },

    /// Suspend an environment and wait until all VMs are suspended
    EnvSuspend {
        /// Environment Id
        #[arg(long, alias = "env-id")]
        envid: String,
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Resume an environment and wait until all VMs are running
    EnvResume {
        /// Environment Id
        #[arg(long, alias = "env-id")]
        envid: String,
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Delete an environment and wait until all VMs are gone
    EnvDelete {
        /// Environment Id
        #[arg(long, alias = "env-id")]
        envid: String,
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// List blueprints
    BlueprintList {
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// List policies
    PolicyList {
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Show all classes
    ClassShowAll,

    /// Show one class
    ClassGet {
        /// Class ID
        class_id: String,
    },

    /// List classes with selected fields
    ClassList {
        /// Comma-separated list of fields to display
        #[arg(long, default_value = "id,name")]
        fields: String,
        /// Regex pattern to match class names
        #[arg(long, default_value = ".*")]
        pattern: String,
    },

    /// Create one or more classes with numbered names
    ClassCreate {
        /// Blueprint ID to create class from
        #[arg(long)]
        blueprint_id: String,
        /// Policy ID to use
        #[arg(long)]
        policy_id: Option<String>,
        /// Base name for the new classes
        #[arg(long)]
        name: Option<String>,
        /// Description for the new classes
        #[arg(long)]
        description: Option<String>,
        /// Number of classes to create
        #[arg(long, default_value_t = 1, value_parser = parse_count)]
        count: u32,
    },

    /// Clone an existing class with numbered names
    ClassClone {
        /// Class ID to clone from
        #[arg(long)]
        class_id: String,
        /// Base suffix for the cloned classes
        #[arg(long, default_value = "")]
        name_suffix: String,
        /// Number of clones
        #[arg(long, default_value_t = 1, value_parser = parse_count)]
        count: u32,
    },

    /// Suspend or resume classes matching a pattern
    ClassSetstatus {
        /// Regex pattern to match class names
        #[arg(long)]
        class_pattern: String,
        /// ACTIVE or SUSPENDED
        #[arg(long, default_value = "ACTIVE", value_parser = parse_class_status)]
        status: ClassStatus,
        /// Match the pattern against class IDs instead of names
        #[arg(long)]
        by_id: bool,
    },

    /// Delete classes matching a pattern
    ClassDelete {
        /// Regex pattern to match class names or IDs
        #[arg(long)]
        class_pattern: String,
        /// Match the pattern against class IDs instead of names
        #[arg(long)]
        by_id: bool,
    },

    /// Delete classes whose end date has passed
    ClassDeleteExpired {
        /// Only list what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
}

/// How a successful run ended.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Done,
    TimedOut,
}

fn parse_positive(s: &str, what: &str) -> Result<u32, String> {
    let n: u32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if n == 0 {
        return Err(format!("{what} must be at least 1"));
    }
    Ok(n)
}

fn parse_count(s: &str) -> Result<u32, String> {
    parse_positive(s, "count")
}

fn parse_attempts(s: &str) -> Result<u32, String> {
    parse_positive(s, "max-attempts")
}

fn parse_class_status(s: &str) -> Result<ClassStatus, String> {
    s.parse().map_err(|e: SdkError| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.loglevel, cli.logfile.as_deref()) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::TimedOut) => ExitCode::from(2),
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Outcome, SdkError> {
    let output = RenderOptions::new(cli.outformat).with_table_width(cli.tablewidth);

    match cli.command {
        Command::JsonMerge { base, overrides } => {
            emit(&merge_json_files(&base, &overrides)?, &output)?;
            Ok(Outcome::Done)
        }
        Command::Api(cmd) => {
            let config = SdkConfig::load(cli.keyfile.as_deref())?;
            let sdk = CloudShareSdk::new(&config)?;
            execute_command(&sdk, cmd, &output)
        }
    }
}

fn execute_command(
    sdk: &CloudShareSdk,
    cmd: ApiCommand,
    output: &RenderOptions,
) -> Result<Outcome, SdkError> {
    match cmd {
        ApiCommand::EnvShowAll => {
            emit(&into_value(sdk.list_environments_with_status()?), output)?;
        }

        ApiCommand::EnvStatus { envid } => {
            emit(&Value::String(sdk.environment_status(&envid)?), output)?;
        }

        ApiCommand::EnvGetInfo { envid, fields } => {
            show_records(vec![sdk.get_environment(&envid)?], &fields, output)?;
        }

        ApiCommand::EnvGetVmsInfo { envid, fields } => {
            show_records(sdk.list_vms(&envid)?, &fields, output)?;
        }

        ApiCommand::EnvCreate {
            blueprint_id,
            policy_id,
            name,
            description,
            count,
        } => {
            let mut options = CreateEnvironmentOptions::new(blueprint_id).with_count(count);
            if let Some(policy_id) = policy_id {
                options = options.with_policy_id(policy_id);
            }
            if let Some(name) = name {
                options = options.with_name(name);
            }
            if let Some(description) = description {
                options = options.with_description(description);
            }
            emit(&Value::Array(sdk.create_environments(&options)?), output)?;
        }

        ApiCommand::EnvSuspend { envid, wait } => {
            return lifecycle(sdk, LifecycleOperation::Suspend, &envid, &wait);
        }

        ApiCommand::EnvResume { envid, wait } => {
            return lifecycle(sdk, LifecycleOperation::Resume, &envid, &wait);
        }

        ApiCommand::EnvDelete { envid, wait } => {
            return lifecycle(sdk, LifecycleOperation::Delete, &envid, &wait);
        }

        ApiCommand::BlueprintList { fields } => {
            show_records(sdk.list_blueprints()?, &fields, output)?;
        }

        ApiCommand::PolicyList { fields } => {
            show_records(sdk.list_policies()?, &fields, output)?;
        }

        ApiCommand::ClassShowAll => {
            emit(&into_value(sdk.list_classes_indexed()?), output)?;
        }

        ApiCommand::ClassGet { class_id } => {
            emit(&Value::Object(sdk.get_class(&class_id)?), output)?;
        }

        ApiCommand::ClassList { fields, pattern } => {
            let fields: Vec<&str> = fields.split(',').map(str::trim).collect();
            let matcher = ClassMatcher::by_name(&pattern)?;
            emit(&into_value(sdk.find_classes(&matcher, &fields)?), output)?;
        }

        ApiCommand::ClassCreate {
            blueprint_id,
            policy_id,
            name,
            description,
            count,
        } => {
            let mut options = CreateClassOptions::new(blueprint_id).with_count(count);
            if let Some(policy_id) = policy_id {
                options = options.with_policy_id(policy_id);
            }
            if let Some(name) = name {
                options = options.with_name(name);
            }
            if let Some(description) = description {
                options = options.with_description(description);
            }
            emit(&Value::Array(sdk.create_classes(&options)?), output)?;
        }

        ApiCommand::ClassClone {
            class_id,
            name_suffix,
            count,
        } => {
            emit(&Value::Array(sdk.clone_class(&class_id, &name_suffix, count)?), output)?;
        }

        ApiCommand::ClassSetstatus {
            class_pattern,
            status,
            by_id,
        } => {
            let matcher = ClassMatcher::new(&class_pattern, by_id)?;
            let results = sdk.set_class_status(&matcher, status)?;
            if !results.is_empty() {
                emit(&Value::Array(results), output)?;
            }
        }

        ApiCommand::ClassDelete {
            class_pattern,
            by_id,
        } => {
            let matcher = ClassMatcher::new(&class_pattern, by_id)?;
            let deleted = sdk.delete_classes(&matcher)?;
            if !deleted.is_empty() {
                emit(&into_value(deleted), output)?;
            }
        }

        ApiCommand::ClassDeleteExpired { dry_run } => {
            let report = sdk.delete_expired_classes(Utc::now(), dry_run)?;
            if !report.is_empty() {
                emit(&into_value(report), output)?;
            }
        }
    }

    Ok(Outcome::Done)
}

fn lifecycle(
    sdk: &CloudShareSdk,
    operation: LifecycleOperation,
    env_id: &str,
    wait: &WaitArgs,
) -> Result<Outcome, SdkError> {
    let outcome = sdk.run_lifecycle(operation, env_id, wait.policy(), ThreadSleeper)?;
    if outcome.is_converged() {
        Ok(Outcome::Done)
    } else {
        Ok(Outcome::TimedOut)
    }
}

fn show_records(
    mut records: Vec<Record>,
    fields: &FieldArgs,
    output: &RenderOptions,
) -> Result<(), SdkError> {
    if fields.availfields {
        let keys: Vec<String> = available_fields(&records).into_iter().collect();
        info!("{}", keys.join(", "));
        return Ok(());
    }
    project_fields(&mut records, &fields.field);
    emit(&into_value(records), output)
}

fn emit(value: &Value, output: &RenderOptions) -> Result<(), SdkError> {
    println!("{}", render(value, output)?);
    Ok(())
}
