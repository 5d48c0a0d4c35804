use serde::{Deserialize, Serialize};

use super::repo_types::PostView;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 20;

/// `?page=&limit=` as sent by the client; unparsable values fall back to defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn parse_positive(value: &Option<String>) -> Option<i64> {
    value
        .as_deref()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n != 0)
}

impl Pagination {
    pub fn page(&self) -> i64 {
        parse_positive(&self.page).unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        parse_positive(&self.limit)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// Body of `POST /posts` and `PUT /posts/:id`. On update only present fields change.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostPage {
    pub posts: Vec<PostView>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

impl PostPage {
    pub fn new(posts: Vec<PostView>, total: i64, page: i64, limit: i64) -> Self {
        Self {
            posts,
            total,
            page,
            pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> Pagination {
        Pagination {
            page: page.map(Into::into),
            limit: limit.map(Into::into),
        }
    }

    #[test]
    fn defaults_and_bounds() {
        let q = query(None, None);
        assert_eq!((q.page(), q.limit(), q.offset()), (1, 10, 0));

        let q = query(Some("3"), Some("50"));
        assert_eq!((q.page(), q.limit(), q.offset()), (3, 20, 40));

        let q = query(Some("-2"), Some("abc"));
        assert_eq!((q.page(), q.limit()), (1, 10));

        let q = query(Some("0"), Some("-5"));
        assert_eq!((q.page(), q.limit()), (1, 1));
    }

    #[test]
    fn pages_round_up() {
        assert_eq!(PostPage::new(Vec::new(), 0, 1, 10).pages, 0);
        assert_eq!(PostPage::new(Vec::new(), 10, 1, 10).pages, 1);
        assert_eq!(PostPage::new(Vec::new(), 11, 1, 10).pages, 2);
    }
}
