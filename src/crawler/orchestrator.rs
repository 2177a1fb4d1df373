//! Crawl orchestration - the traversal of one session
//!
//! This module walks a page range of the source and writes what it finds to the catalog:
//! - Listing pages are fetched in order and their items processed in listing order
//! - New comics are created with their categories; known comics are updated incrementally
//! - Chapters above the comic's high-water mark are ingested together with their images
//! - Progress snapshots are published after every state change
//!
//! Failures are contained at the smallest unit that can absorb them. A failed page or
//! chapter is logged and skipped, a failed item is recorded in the session's errors, and
//! only an interrupted pacing wait ends the run.

use crate::catalog::{
    CatalogStore, ChapterStatus, ComicRecord, ComicStatus, NewChapter, NewChapterImage, NewComic,
};
use crate::crawler::pacer::{Pacer, RunControl};
use crate::crawler::parser::parse_chapter_number;
use crate::progress::ProgressReporter;
use crate::session::{ChapterSummary, CrawlRequest, CrawlSession, CrawlStatus};
use crate::slug::slugify;
use crate::source::{SourceClient, SourceItemDetail, SourceItemSummary};
use crate::{CrawlError, CrawlResult};
use std::sync::Arc;

/// How a traversal that did not fail came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every requested page was visited
    Completed,
    /// A stop request was honoured at a checkpoint
    Stopped,
}

impl RunOutcome {
    pub fn status(&self) -> CrawlStatus {
        match self {
            Self::Completed => CrawlStatus::Completed,
            Self::Stopped => CrawlStatus::Stopped,
        }
    }
}

/// Shared, stateless driver of crawl traversals
///
/// One orchestrator serves every session; all per-run state lives in the `CrawlSession`
/// passed to `run`.
pub struct CrawlOrchestrator {
    source: Arc<dyn SourceClient>,
    catalog: Arc<dyn CatalogStore>,
    pacer: Pacer,
    reporter: ProgressReporter,
}

/// What an item resolved to in the catalog before its chapters are ingested
struct ItemTarget {
    comic: ComicRecord,
    created: bool,
    high_water_mark: Option<f64>,
}

impl CrawlOrchestrator {
    pub fn new(
        source: Arc<dyn SourceClient>,
        catalog: Arc<dyn CatalogStore>,
        pacer: Pacer,
        reporter: ProgressReporter,
    ) -> Self {
        Self {
            source,
            catalog,
            pacer,
            reporter,
        }
    }

    pub fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }

    /// Walks the requested page range, mutating `session` as it goes
    ///
    /// Returns `Err(CrawlError::Interrupted)` only when a shutdown cuts the run short. The
    /// caller owns the final status transition.
    pub async fn run(
        &self,
        request: &CrawlRequest,
        session: &mut CrawlSession,
        control: &RunControl,
    ) -> CrawlResult<RunOutcome> {
        if let Err(e) = session.transition(CrawlStatus::InProgress) {
            tracing::warn!("Session {}: {}", session.session_id, e);
        }
        self.reporter.publish(session);

        tracing::info!(
            "Session {} crawling pages {}..={}",
            session.session_id,
            request.start_page,
            request.end_page
        );
        if request.save_to_secondary_storage {
            tracing::info!(
                "Session {} requested secondary storage; no secondary storage is configured",
                session.session_id
            );
        }

        let mut items_attempted: u32 = 0;

        for (index, page) in request.page_range().pages().enumerate() {
            if checkpoint(control)? {
                tracing::info!("Session {} stopped before page {}", session.session_id, page);
                return Ok(RunOutcome::Stopped);
            }

            if index > 0 {
                self.pacer.delay_between_requests(control).await?;
                if checkpoint(control)? {
                    tracing::info!("Session {} stopped before page {}", session.session_id, page);
                    return Ok(RunOutcome::Stopped);
                }
            }

            session.set_page(page);
            self.reporter.publish(session);

            let items = match self.source.list_items(page).await {
                Ok(items) if items.is_empty() => {
                    tracing::warn!("Page {} listed no items", page);
                    continue;
                }
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("Failed to list page {}: {}", page, e);
                    continue;
                }
            };
            tracing::debug!("Page {} listed {} items", page, items.len());

            for item in &items {
                if checkpoint(control)? {
                    tracing::info!(
                        "Session {} stopped on page {} before {}",
                        session.session_id,
                        page,
                        item.slug
                    );
                    return Ok(RunOutcome::Stopped);
                }

                self.pacer.delay_between_requests(control).await?;
                if checkpoint(control)? {
                    tracing::info!(
                        "Session {} stopped on page {} before {}",
                        session.session_id,
                        page,
                        item.slug
                    );
                    return Ok(RunOutcome::Stopped);
                }

                let slug = slugify(&item.name);
                session.begin_item(&item.slug);
                self.reporter.publish(session);

                match self.process_item(item, &slug, session, control).await {
                    Ok(successful) => {
                        session.finish_item(successful);
                        if request.save_to_secondary_storage && successful {
                            self.save_to_secondary_storage(&slug);
                        }
                    }
                    Err(CrawlError::Interrupted) => return Err(CrawlError::Interrupted),
                    Err(e) => {
                        let key = if slug.is_empty() { &item.slug } else { &slug };
                        tracing::warn!("Item {} failed: {}", key, e);
                        session.record_error(key.as_str(), e.to_string());
                    }
                }
                self.reporter.publish(session);

                items_attempted += 1;
                self.pacer.maybe_batch_pause(items_attempted, control).await?;
                if checkpoint(control)? {
                    tracing::info!("Session {} stopped on page {}", session.session_id, page);
                    return Ok(RunOutcome::Stopped);
                }
            }
        }

        tracing::info!(
            "Session {} finished: {} items processed, {} successful, {} errors",
            session.session_id,
            session.total_items_processed,
            session.total_successful_items,
            session.errors.len()
        );
        Ok(RunOutcome::Completed)
    }

    /// Creates or updates one item; `Ok(true)` when it was created or gained chapters
    async fn process_item(
        &self,
        item: &SourceItemSummary,
        slug: &str,
        session: &mut CrawlSession,
        control: &RunControl,
    ) -> CrawlResult<bool> {
        if slug.is_empty() {
            return Err(CrawlError::InvalidItem(format!(
                "name {:?} yields an empty slug",
                item.name
            )));
        }

        let target = self.resolve_comic(item, slug)?;
        let detail = self.source.fetch_item_detail(&item.slug).await?;
        let ingested = self
            .process_chapters(&target, &detail, session, control)
            .await?;

        tracing::debug!(
            "Item {} {}: {} new chapters",
            slug,
            if target.created { "created" } else { "updated" },
            ingested
        );
        Ok(target.created || ingested > 0)
    }

    /// Finds the comic for `slug`, creating it with its categories when absent
    fn resolve_comic(&self, item: &SourceItemSummary, slug: &str) -> CrawlResult<ItemTarget> {
        if let Some(comic) = self.catalog.find_comic_by_slug(slug)? {
            let high_water_mark = self.catalog.max_chapter_number(comic.id)?;
            tracing::debug!(
                "Updating {} (id {}), high-water mark {:?}",
                slug,
                comic.id,
                high_water_mark
            );
            return Ok(ItemTarget {
                comic,
                created: false,
                high_water_mark,
            });
        }

        let mut category_ids = Vec::with_capacity(item.category.len());
        for category in &item.category {
            let record = self
                .catalog
                .find_or_create_category(&category.name, &slugify(&category.name))?;
            category_ids.push(record.id);
        }

        let origin_name = (!item.origin_name.is_empty()).then(|| item.origin_name.join(", "));
        let upserted = self.catalog.find_or_create_comic(&NewComic {
            name: item.name.clone(),
            slug: slug.to_string(),
            origin_name,
            thumb_url: item.thumb_url.clone(),
            status: ComicStatus::from_source(&item.status),
            description: None,
            category_ids,
        })?;
        let comic = upserted.record;

        if !upserted.created {
            // Another session created it between the lookup and the insert
            let high_water_mark = self.catalog.max_chapter_number(comic.id)?;
            tracing::debug!(
                "Comic {} (id {}) already created, high-water mark {:?}",
                slug,
                comic.id,
                high_water_mark
            );
            return Ok(ItemTarget {
                comic,
                created: false,
                high_water_mark,
            });
        }
        tracing::info!("Created comic {} (id {})", slug, comic.id);

        Ok(ItemTarget {
            comic,
            created: true,
            high_water_mark: None,
        })
    }

    /// Ingests the new chapters of one item in source order, returning how many were written
    async fn process_chapters(
        &self,
        target: &ItemTarget,
        detail: &SourceItemDetail,
        session: &mut CrawlSession,
        control: &RunControl,
    ) -> CrawlResult<u32> {
        let comic = &target.comic;
        let mut ingested: u32 = 0;

        for chapter in detail.first_server_chapters() {
            if checkpoint(control)? {
                tracing::debug!("Stop requested, leaving {} mid-item", comic.slug);
                break;
            }

            self.pacer.delay_between_requests(control).await?;
            if checkpoint(control)? {
                tracing::debug!("Stop requested, leaving {} mid-item", comic.slug);
                break;
            }

            let Some(number) = parse_chapter_number(&chapter.chapter_name) else {
                tracing::warn!(
                    "Skipping chapter {:?} of {}: not a number",
                    chapter.chapter_name,
                    comic.slug
                );
                continue;
            };

            if target.high_water_mark.is_some_and(|mark| number <= mark) {
                tracing::trace!("Chapter {} of {} below high-water mark", number, comic.slug);
                continue;
            }
            if self.catalog.chapter_exists(comic.id, number)? {
                tracing::debug!("Chapter {} of {} already stored", number, comic.slug);
                continue;
            }

            let images = match self
                .source
                .fetch_chapter_images(&chapter.chapter_api_data)
                .await
            {
                Ok(images) => images,
                Err(e) => {
                    tracing::warn!(
                        "Skipping chapter {} of {}: {}",
                        number,
                        comic.slug,
                        e
                    );
                    continue;
                }
            };

            let title = match chapter.chapter_title.as_deref().map(str::trim) {
                Some(title) if !title.is_empty() => title.to_string(),
                _ => format!("Chapter {}", chapter.chapter_name.trim()),
            };
            let new_images: Vec<NewChapterImage> = images
                .images
                .iter()
                .enumerate()
                .map(|(idx, image)| NewChapterImage {
                    ordinal: idx as u32 + 1,
                    image_file: image.image_file.clone(),
                })
                .collect();

            let upserted = self.catalog.insert_chapter_with_images(
                &NewChapter {
                    comic_id: comic.id,
                    title,
                    chapter_number: number,
                    status: ChapterStatus::Free,
                    domain_cdn: Some(images.cdn_domain.clone()).filter(|s| !s.is_empty()),
                    chapter_path: Some(images.chapter_path.clone()).filter(|s| !s.is_empty()),
                },
                &new_images,
            )?;
            if !upserted.created {
                tracing::debug!(
                    "Chapter {} of {} stored concurrently, not counted",
                    number,
                    comic.slug
                );
                continue;
            }

            session.record_chapter(ChapterSummary {
                comic_name: comic.name.clone(),
                comic_id: comic.id,
                chapter_number: number,
                chapter_id: upserted.record.id,
                image_count: new_images.len(),
            });
            self.reporter.publish(session);

            ingested += 1;
            self.pacer.maybe_batch_pause(ingested, control).await?;
        }

        Ok(ingested)
    }

    /// Extension point for mirroring ingested items elsewhere
    fn save_to_secondary_storage(&self, slug: &str) {
        tracing::debug!("Secondary storage not configured, skipping {}", slug);
    }
}

/// `Ok(true)` when the session should stop here, `Err` when the registry is shutting down
fn checkpoint(control: &RunControl) -> CrawlResult<bool> {
    if control.shutdown.is_cancelled() {
        return Err(CrawlError::Interrupted);
    }
    Ok(control.is_stop_requested())
}
