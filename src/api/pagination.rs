// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Page-number pagination shared by the list endpoints.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::{PageRef, PagedResponse, Pagination};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number (default 1)
    pub page: Option<usize>,
    /// Items per page (default 10, at most 100)
    pub limit: Option<usize>,
}

impl PageParams {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    fn start(&self) -> usize {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Slice out this page and report the total count.
    pub fn apply<T>(&self, items: Vec<T>) -> (Vec<T>, usize) {
        let total = items.len();
        let page = items.into_iter().skip(self.start()).take(self.limit()).collect();
        (page, total)
    }

    /// `{count, total, page, pages}` envelope.
    pub fn paged<T>(&self, items: Vec<T>) -> PagedResponse<T> {
        let (data, total) = self.apply(items);
        PagedResponse {
            success: true,
            count: data.len(),
            total,
            page: self.page(),
            pages: total.div_ceil(self.limit()),
            data,
        }
    }

    /// Neighbouring pages that exist around this one.
    pub fn neighbours(&self, total: usize) -> Pagination {
        let end = self.start().saturating_add(self.limit());
        Pagination {
            next: (end < total).then(|| PageRef {
                page: self.page() + 1,
                limit: self.limit(),
            }),
            prev: (self.start() > 0).then(|| PageRef {
                page: self.page() - 1,
                limit: self.limit(),
            }),
        }
    }
}
