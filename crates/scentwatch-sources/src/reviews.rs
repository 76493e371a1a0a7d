//! Paginated scraper for a product's critical reviews.

use std::future::Future;

use scentwatch_core::{record::RawReview, source::Source, watermark::Watermark};
use tracing::{debug, info, warn};

use crate::{HttpConfig, Result, html::parse_review_page};

/// Critical reviews of the tracked candle, most recent first. `{page}` is
/// replaced with the 1-based page number.
pub const DEFAULT_URL_TEMPLATE: &str = "https://www.amazon.com/Yankee-Candle-Large-Balsam-Cedar/product-reviews/\
                                        B000JDGC78/ref=cm_cr_arp_d_viewopt_srt?ie=UTF8&reviewerType=all_reviews&\
                                        filterByStar=critical&pageNumber={page}&sortBy=recent";

/// Something that can return the HTML of review page `page` (1-based).
pub trait PageFetcher: Send + Sync {
  fn fetch_page(&self, page: u32) -> impl Future<Output = Result<String>> + Send + '_;
}

/// Fetches review pages over HTTP.
#[derive(Clone)]
pub struct HttpPageFetcher {
  client:       reqwest::Client,
  url_template: String,
}

impl HttpPageFetcher {
  pub fn new(url_template: impl Into<String>, http: &HttpConfig) -> Result<Self> {
    Ok(Self { client: http.client()?, url_template: url_template.into() })
  }

  pub fn page_url(&self, page: u32) -> String { self.url_template.replace("{page}", &page.to_string()) }
}

impl PageFetcher for HttpPageFetcher {
  async fn fetch_page(&self, page: u32) -> Result<String> {
    let url = self.page_url(page);
    debug!(page, %url, "rendering review page");
    Ok(self.client.get(&url).send().await?.error_for_status()?.text().await?)
  }
}

/// Why a scrape stopped turning pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
  /// A page's oldest review is at or before the watermark.
  ReachedWatermark,
  /// A page had no reviews left.
  EmptyPage,
  /// `max_pages` ran out while every page was still newer than the
  /// watermark; older new reviews were not fetched.
  PageLimit,
}

/// Walks review pages newest-first until it reaches already-seen dates.
pub struct ReviewScraper<F> {
  fetcher:   F,
  max_pages: u32,
}

impl<F: PageFetcher> ReviewScraper<F> {
  pub fn new(fetcher: F, max_pages: u32) -> Self { Self { fetcher, max_pages } }

  /// Collect reviews page by page.
  ///
  /// Stops after the first page whose oldest review is at or before
  /// `watermark`, after a page with no reviews, or at `max_pages`. The last
  /// page may contain reviews at or before the watermark; callers filter.
  pub async fn scrape(&self, watermark: Watermark) -> Result<Vec<RawReview>> {
    let (reviews, stop) = self.scrape_pages(watermark).await?;
    if stop == StopReason::PageLimit {
      warn!(
        max_pages = self.max_pages,
        %watermark,
        "page limit reached before the watermark; older reviews are skipped"
      );
    }
    Ok(reviews)
  }

  /// [`Self::scrape`], also reporting why paging stopped.
  pub async fn scrape_pages(&self, watermark: Watermark) -> Result<(Vec<RawReview>, StopReason)> {
    let mut collected = Vec::new();
    let mut stop = StopReason::PageLimit;

    for page in 1..=self.max_pages {
      let html = self.fetcher.fetch_page(page).await?;
      let reviews = parse_review_page(&html)?;
      debug!(page, reviews = reviews.len(), "parsed review page");

      let Some(oldest) = reviews.iter().map(|r| r.date).min() else {
        stop = StopReason::EmptyPage;
        break;
      };
      collected.extend(reviews);

      if !watermark.admits(oldest) {
        stop = StopReason::ReachedWatermark;
        break;
      }
    }

    info!(reviews = collected.len(), ?stop, "scraped review pages");
    Ok((collected, stop))
  }
}

impl<F: PageFetcher> Source for ReviewScraper<F> {
  type Row = RawReview;

  fn name(&self) -> &'static str { "ingest-reviews" }

  async fn fetch(&self, watermark: Watermark) -> scentwatch_core::Result<Vec<RawReview>> {
    Ok(self.scrape(watermark).await?)
  }
}
