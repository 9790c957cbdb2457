use clap::Subcommand;
use serde_json::json;

use crate::auth::Guard;
use crate::cli::context::{user_facing, CliContext};
use crate::cli::utils::{fit, output_item, output_page, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::filter::{filter_and_paginate, FilterCriteria};
use crate::models::{Category, CategoryDraft};

#[derive(Subcommand)]
pub enum CategoryCommands {
    #[command(about = "List categories, optionally searched by name")]
    List {
        #[arg(long, short, help = "Case-insensitive search over the name")]
        search: Option<String>,
        #[arg(long, short, default_value_t = 1, help = "Page number, starting at 1")]
        page: usize,
        #[arg(long, help = "Categories per page")]
        page_size: Option<usize>,
    },

    #[command(about = "Show a single category")]
    Show {
        #[arg(help = "Category id")]
        id: String,
    },

    #[command(about = "Create a category (Admin)")]
    Create {
        #[arg(help = "Category name")]
        name: String,
    },

    #[command(about = "Rename a category (Admin)")]
    Update {
        #[arg(help = "Category id")]
        id: String,
        #[arg(help = "New name")]
        name: String,
    },

    #[command(about = "Delete a category (Admin)")]
    Delete {
        #[arg(help = "Category id")]
        id: String,
    },
}

pub async fn handle(cmd: CategoryCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let ctx = CliContext::load(output_format).await?;
    let client = ctx.client.clone();

    match cmd {
        CategoryCommands::List { search, page, page_size } => {
            ctx.require(&Guard::authenticated())?;

            let categories = ctx
                .session
                .authorized(move |token| async move { client.list_categories(&token).await })
                .await
                .map_err(user_facing)?;

            let criteria = FilterCriteria::new(search.unwrap_or_default());
            let page_size = page_size.unwrap_or(config().pagination.category_page_size);
            let page = filter_and_paginate(&categories, &criteria, page, page_size);

            output_page(&ctx.output, &page, "categories", "No categories found.", |category: &Category| {
                format!("{}  {}", fit(&category.id, 6), category.name)
            })
        }
        CategoryCommands::Show { id } => {
            ctx.require(&Guard::authenticated())?;

            let category = ctx
                .session
                .authorized(move |token| async move { client.get_category(&token, &id).await })
                .await
                .map_err(user_facing)?;

            output_item(&ctx.output, &category, |c| format!("ID: {}\nName: {}", c.id, c.name))
        }
        CategoryCommands::Create { name } => {
            ctx.require(&Guard::admin())?;

            let draft = CategoryDraft::new(name);
            draft.validate()?;

            let category = ctx
                .session
                .authorized(move |token| async move { client.create_category(&token, &draft).await })
                .await
                .map_err(user_facing)?;

            output_success(
                &ctx.output,
                &format!("Category '{}' created", category.name),
                Some(json!({ "category": category })),
            )
        }
        CategoryCommands::Update { id, name } => {
            ctx.require(&Guard::admin())?;

            let draft = CategoryDraft::new(name);
            draft.validate()?;

            let category = ctx
                .session
                .authorized(move |token| async move { client.update_category(&token, &id, &draft).await })
                .await
                .map_err(user_facing)?;

            output_success(
                &ctx.output,
                &format!("Category {} renamed to '{}'", category.id, category.name),
                Some(json!({ "category": category })),
            )
        }
        CategoryCommands::Delete { id } => {
            ctx.require(&Guard::admin())?;

            let target = id.clone();
            ctx.session
                .authorized(move |token| async move { client.delete_category(&token, &target).await })
                .await
                .map_err(user_facing)?;

            output_success(
                &ctx.output,
                &format!("Category {} deleted", id),
                Some(json!({ "id": id })),
            )
        }
    }
}
