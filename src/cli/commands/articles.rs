use clap::Subcommand;
use serde_json::json;

use crate::auth::Guard;
use crate::cli::context::{user_facing, CliContext};
use crate::cli::utils::{fit, output_item, output_page, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::filter::{filter_and_paginate, FilterCriteria};
use crate::models::{Article, ArticleDraft};

#[derive(Subcommand)]
pub enum ArticleCommands {
    #[command(about = "List articles, optionally searched and filtered by category")]
    List {
        #[arg(long, short, help = "Case-insensitive search over title, content and excerpt")]
        search: Option<String>,
        #[arg(long, short, help = "Only articles in this category id")]
        category: Option<String>,
        #[arg(long, short, default_value_t = 1, help = "Page number, starting at 1")]
        page: usize,
        #[arg(long, help = "Articles per page")]
        page_size: Option<usize>,
    },

    #[command(about = "Show a single article")]
    Show {
        #[arg(help = "Article id")]
        id: String,
    },

    #[command(about = "Create an article (Admin)")]
    Create {
        #[arg(long, help = "Article title")]
        title: String,
        #[arg(long, help = "Article body")]
        content: String,
        #[arg(long, help = "Short summary; derived from the content when omitted")]
        excerpt: Option<String>,
        #[arg(long, help = "Category id")]
        category: String,
    },

    #[command(about = "Update an article (Admin)")]
    Update {
        #[arg(help = "Article id")]
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        excerpt: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },

    #[command(about = "Delete an article (Admin)")]
    Delete {
        #[arg(help = "Article id")]
        id: String,
    },
}

pub async fn handle(cmd: ArticleCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let ctx = CliContext::load(output_format).await?;
    let client = ctx.client.clone();

    match cmd {
        ArticleCommands::List {
            search,
            category,
            page,
            page_size,
        } => {
            ctx.require(&Guard::authenticated())?;

            let articles = ctx
                .session
                .authorized(move |token| async move { client.list_articles(&token).await })
                .await
                .map_err(user_facing)?;

            let mut criteria = FilterCriteria::new(search.unwrap_or_default());
            if let Some(category) = category {
                criteria = criteria.with_category(category);
            }
            let page_size = page_size.unwrap_or(config().pagination.article_page_size);
            let page = filter_and_paginate(&articles, &criteria, page, page_size);

            output_page(&ctx.output, &page, "articles", "No articles found.", article_row)
        }
        ArticleCommands::Show { id } => {
            ctx.require(&Guard::authenticated())?;

            let article = ctx
                .session
                .authorized(move |token| async move { client.get_article(&token, &id).await })
                .await
                .map_err(user_facing)?;

            output_item(&ctx.output, &article, describe_article)
        }
        ArticleCommands::Create {
            title,
            content,
            excerpt,
            category,
        } => {
            ctx.require(&Guard::admin())?;

            let draft = ArticleDraft {
                title,
                content,
                excerpt,
                category_id: category,
            };
            draft.validate()?;

            let article = ctx
                .session
                .authorized(move |token| async move { client.create_article(&token, &draft).await })
                .await
                .map_err(user_facing)?;

            output_success(
                &ctx.output,
                &format!("Article {} created", article.id),
                Some(json!({ "article": article })),
            )
        }
        ArticleCommands::Update {
            id,
            title,
            content,
            excerpt,
            category,
        } => {
            ctx.require(&Guard::admin())?;

            let fetch_client = client.clone();
            let fetch_id = id.clone();
            let current = ctx
                .session
                .authorized(move |token| async move { fetch_client.get_article(&token, &fetch_id).await })
                .await
                .map_err(user_facing)?;

            let draft = merge_draft(current, title, content, excerpt, category);
            draft.validate()?;

            let article = ctx
                .session
                .authorized(move |token| async move { client.update_article(&token, &id, &draft).await })
                .await
                .map_err(user_facing)?;

            output_success(
                &ctx.output,
                &format!("Article {} updated", article.id),
                Some(json!({ "article": article })),
            )
        }
        ArticleCommands::Delete { id } => {
            ctx.require(&Guard::admin())?;

            let target = id.clone();
            ctx.session
                .authorized(move |token| async move { client.delete_article(&token, &target).await })
                .await
                .map_err(user_facing)?;

            output_success(
                &ctx.output,
                &format!("Article {} deleted", id),
                Some(json!({ "id": id })),
            )
        }
    }
}

/// Applies the flags given on the command line over the stored article.
/// A new body without a new excerpt gets its excerpt derived again.
fn merge_draft(
    current: Article,
    title: Option<String>,
    content: Option<String>,
    excerpt: Option<String>,
    category: Option<String>,
) -> ArticleDraft {
    let content_changed = content.is_some();
    ArticleDraft {
        title: title.unwrap_or(current.title),
        content: content.unwrap_or(current.content),
        excerpt: match excerpt {
            Some(excerpt) => Some(excerpt),
            None if content_changed => None,
            None => Some(current.excerpt).filter(|e| !e.is_empty()),
        },
        category_id: category.unwrap_or(current.category_id),
    }
}

fn article_row(article: &Article) -> String {
    let category = article
        .category
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or(article.category_id.as_str());
    format!("{}  {}  {}", fit(&article.id, 6), fit(&article.title, 40), fit(category, 16))
}

fn describe_article(article: &Article) -> String {
    let mut lines = vec![
        format!("ID: {}", article.id),
        format!("Title: {}", article.title),
        format!("Category: {}", article.category_id),
    ];
    if let Some(user) = &article.user {
        lines.push(format!("Author: {}", user.username));
    }
    if let Some(created_at) = article.created_at {
        lines.push(format!("Created: {}", created_at.to_rfc3339()));
    }
    if !article.excerpt.is_empty() {
        lines.push(String::new());
        lines.push(article.excerpt.clone());
    }
    lines.push(String::new());
    lines.push(article.content.clone());
    lines.join("\n")
}
