use crate::error::{ApiError, ApiResult};
use garde::Validate;
use serde::Serialize;
use translog_dal::{Batch, ListingParams, Order, SortField};

/// Paging query parameters. `page` is zero-based, sortBy takes the JSON
/// field names of the record.
#[derive(Debug, Clone, Validate, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
#[garde(allow_unvalidated)]
pub struct Paging {
    page: Option<u32>,
    #[garde(range(min = 1, max = 1000))]
    size: Option<u32>,
    #[garde(length(max = 255))]
    sort_by: Option<String>,
    #[garde(length(max = 10))]
    sort_dir: Option<String>,
}

impl Paging {
    pub fn into_listing_params(self, default_page_size: u32) -> ApiResult<ListingParams> {
        let page = self.page.unwrap_or(0);
        let size = self.size.unwrap_or(default_page_size);
        let offset = page as i64 * size as i64;

        let field = match self.sort_by.as_deref() {
            None => SortField::CreatedAt,
            Some(name) => name
                .parse()
                .map_err(|_| ApiError::InvalidQuery(format!("Invalid sort field: {name}")))?,
        };
        let order = match self.sort_dir.as_deref() {
            None => Order::Desc(field),
            Some(dir) if dir.eq_ignore_ascii_case("desc") => Order::Desc(field),
            Some(dir) if dir.eq_ignore_ascii_case("asc") => Order::Asc(field),
            Some(dir) => {
                return Err(ApiError::InvalidQuery(format!(
                    "Invalid sort direction: {dir}"
                )));
            }
        };

        Ok(ListingParams::new(offset, size as i64).with_order(order))
    }

    pub fn page_size(&self, default_page_size: u32) -> u32 {
        self.size.unwrap_or(default_page_size)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    content: Vec<T>,
    page: u32,
    size: u32,
    total_elements: u64,
    total_pages: u32,
}

impl<T> Page<T>
where
    T: Serialize,
{
    pub fn try_from_batch(
        batch: Batch<T>,
        page_size: u32,
    ) -> Result<Self, std::num::TryFromIntError> {
        Ok(Self {
            page: u32::try_from(batch.offset)? / page_size,
            size: page_size,
            total_pages: u32::try_from((batch.total + page_size as u64 - 1) / page_size as u64)?,
            total_elements: batch.total,
            content: batch.rows,
        })
    }

    pub fn from_batch(batch: Batch<T>, page_size: u32) -> Self {
        Self::try_from_batch(batch, page_size).expect("Failed to convert batch to page")
        // As we control the batch, this should never fail
    }
}
