// src/crawl/discovery.rs
//! Phase one of a crawl: learn how many catalog pages exist.

use crate::api::Fetcher;
use crate::config::CrawlConfig;
use crate::constants::LAST_PAGE_SELECTOR;
use crate::document::{DocumentReader, HtmlDocument, NodeReader};
use crate::error::DiscoveryError;
use url::Url;

/// Issues the single discovery request and reads the page count from the
/// catalog's "last page" navigation link.
pub struct DiscoveryProbe<'a, F: ?Sized> {
    fetcher: &'a F,
    config: &'a CrawlConfig,
}

impl<'a, F: Fetcher + ?Sized> DiscoveryProbe<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a CrawlConfig) -> Self {
        Self { fetcher, config }
    }

    /// Fetches the catalog root and returns the number of pages.
    ///
    /// Every failure here is fatal for the run: without a page count there
    /// is nothing to plan.
    pub async fn page_count(&self) -> Result<u32, DiscoveryError> {
        let url = self.config.discovery_url();
        log::debug!("Probing {} for the page count", url);

        let page = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(DiscoveryError::Fetch)?;

        let href = {
            let document = HtmlDocument::parse(&page.text());
            last_page_href(&document)
        }
        .ok_or_else(|| DiscoveryError::LinkMissing {
            url: url.to_string(),
            selector: LAST_PAGE_SELECTOR,
        })?;

        let page_count = parse_page_count(&href, &url)?;
        log::info!(
            "task params: resultsPerPage {}, pageCount {}",
            self.config.results_per_page,
            page_count
        );
        Ok(page_count)
    }
}

/// The `href` of the first last-page link that carries one.
pub fn last_page_href<D: DocumentReader>(document: &D) -> Option<String> {
    document
        .select(LAST_PAGE_SELECTOR)
        .iter()
        .find_map(|node| node.attr("href"))
}

/// Reads the positive `page` query parameter of a last-page link.
///
/// Relative links such as `?page=432&results_per_page=30` are resolved
/// against `base`.
pub fn parse_page_count(href: &str, base: &Url) -> Result<u32, DiscoveryError> {
    let resolved = base
        .join(href)
        .map_err(|source| DiscoveryError::MalformedHref {
            href: href.to_string(),
            source,
        })?;

    let value = resolved
        .query_pairs()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| DiscoveryError::PageParamMissing {
            href: href.to_string(),
        })?;

    let count: u32 = value
        .trim()
        .parse()
        .map_err(|_| DiscoveryError::PageParamInvalid {
            href: href.to_string(),
            value: value.clone(),
        })?;

    if count == 0 {
        return Err(DiscoveryError::ZeroPages {
            href: href.to_string(),
        });
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FetchedPage;
    use crate::error::FetchError;
    use pretty_assertions::assert_eq;

    fn base() -> Url {
        Url::parse("https://hobbygames.ru/catalog-all?results_per_page=200").unwrap()
    }

    #[test]
    fn reads_the_page_parameter() {
        assert_eq!(
            parse_page_count("?page=432&results_per_page=30", &base()).unwrap(),
            432
        );
        assert_eq!(
            parse_page_count("https://hobbygames.ru/catalog-all?results_per_page=30&page=7", &base())
                .unwrap(),
            7
        );
    }

    #[test]
    fn rejects_missing_invalid_and_zero_pages() {
        assert!(matches!(
            parse_page_count("?results_per_page=30", &base()),
            Err(DiscoveryError::PageParamMissing { .. })
        ));
        assert!(matches!(
            parse_page_count("?page=abc", &base()),
            Err(DiscoveryError::PageParamInvalid { value, .. }) if value == "abc"
        ));
        assert!(matches!(
            parse_page_count("?page=-3", &base()),
            Err(DiscoveryError::PageParamInvalid { .. })
        ));
        assert!(matches!(
            parse_page_count("?page=0", &base()),
            Err(DiscoveryError::ZeroPages { .. })
        ));
    }

    #[test]
    fn first_last_link_with_href_wins() {
        let document = HtmlDocument::parse(
            r#"<div>
                 <span class="last">no link</span>
                 <a class="last" href="?page=12">12</a>
                 <a class="last" href="?page=99">99</a>
               </div>"#,
        );
        assert_eq!(last_page_href(&document).as_deref(), Some("?page=12"));
    }

    struct OnePage(Result<FetchedPage, FetchError>);

    #[async_trait::async_trait]
    impl Fetcher for OnePage {
        async fn fetch(&self, _url: &Url) -> Result<FetchedPage, FetchError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn probe_returns_the_count() {
        let config = CrawlConfig::from_constants().unwrap();
        let fetcher = OnePage(Ok(FetchedPage::ok(
            config.discovery_url(),
            r#"<a href="?page=432&amp;results_per_page=30" class="last">432</a>"#,
        )));

        let count = DiscoveryProbe::new(&fetcher, &config).page_count().await.unwrap();
        assert_eq!(count, 432);
    }

    #[tokio::test]
    async fn probe_fails_without_the_link() {
        let config = CrawlConfig::from_constants().unwrap();
        let fetcher = OnePage(Ok(FetchedPage::ok(
            config.discovery_url(),
            "<html><body>maintenance</body></html>",
        )));

        let err = DiscoveryProbe::new(&fetcher, &config)
            .page_count()
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::LinkMissing { selector: ".last", .. }));
    }

    #[tokio::test]
    async fn probe_fails_when_the_fetch_fails() {
        let config = CrawlConfig::from_constants().unwrap();
        let fetcher = OnePage(Err(FetchError::HttpStatus {
            url: config.discovery_url().to_string(),
            status: 503,
        }));

        let err = DiscoveryProbe::new(&fetcher, &config)
            .page_count()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::Fetch(FetchError::HttpStatus { status: 503, .. })
        ));
    }
}
