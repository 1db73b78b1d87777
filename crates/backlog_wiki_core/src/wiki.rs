use anyhow::{Context, Result};

use crate::client::{WikiApi, WikiPage};
use crate::guard::{ProjectGuard, ProjectMismatch};

#[derive(Debug, Clone)]
pub struct GetWikiOutcome {
    pub page: WikiPage,
    pub mismatch: Option<ProjectMismatch>,
}

#[derive(Debug, Clone)]
pub struct DeleteWikiOutcome {
    pub fetched: GetWikiOutcome,
    pub deleted: WikiPage,
}

/// Guard first, then one create request.
pub fn create_wiki<A: WikiApi>(
    api: &mut A,
    guard: &ProjectGuard,
    project_id: u64,
    name: &str,
    content: &str,
    notify: bool,
) -> Result<WikiPage> {
    guard.ensure_allowed(project_id)?;
    api.create_wiki(project_id, name, content, notify)
}

// The guard covers create only; updates address pages by wiki id and are
// sent without a project check.
pub fn update_wiki<A: WikiApi>(
    api: &mut A,
    wiki_id: u64,
    name: &str,
    content: &str,
    notify: bool,
) -> Result<WikiPage> {
    api.update_wiki(wiki_id, name, content, notify)
}

pub fn get_wiki<A: WikiApi>(
    api: &mut A,
    guard: &ProjectGuard,
    wiki_id: u64,
) -> Result<GetWikiOutcome> {
    let page = api.get_wiki(wiki_id)?;
    let mismatch = guard.mismatch(page.project_id);
    Ok(GetWikiOutcome { page, mismatch })
}

/// Fetch the page, then delete it. A failed fetch stops the operation
/// before the delete request goes out.
pub fn delete_wiki<A: WikiApi>(
    api: &mut A,
    guard: &ProjectGuard,
    wiki_id: u64,
    notify: bool,
) -> Result<DeleteWikiOutcome> {
    let fetched = get_wiki(api, guard, wiki_id)
        .with_context(|| format!("wiki {wiki_id} could not be fetched before delete"))?;
    let deleted = api.delete_wiki(wiki_id, notify)?;
    Ok(DeleteWikiOutcome { fetched, deleted })
}
