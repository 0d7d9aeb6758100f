//! Translation between URL query parameters and structured [`Request`]s.
//!
//! Translation never fails: malformed fragments fall back to defaults
//! (ascending sort, omitted facet options, `None` index positions).

use shared::{
    request::{
        Direction, FacetSort, FacetSpec, Indexable, OperationKey, Pageable, Request, Sort,
    },
    router::QueryParams,
};

const FACET_OPTIONS: [&str; 4] = ["limit", "offset", "sort", "filter"];

pub fn translate(params: &QueryParams) -> Request {
    Request {
        pageable: build_pageable(params),
        facets: build_facets(params),
        indexable: build_indexable(params),
        query: params.get("query").map(str::to_string),
    }
}

fn build_pageable(params: &QueryParams) -> Pageable {
    Pageable {
        number: params.get("page").and_then(|raw| raw.trim().parse().ok()),
        size: params.get("size").and_then(|raw| raw.trim().parse().ok()),
        sort: params.get_all("sort").iter().map(|raw| split_sort(raw)).collect(),
    }
}

fn split_sort(raw: &str) -> Sort {
    let mut parts = raw.split(',');
    let field = parts.next().unwrap_or_default();
    let direction = parts
        .next()
        .map(Direction::parse_lenient)
        .unwrap_or_default();
    Sort::new(field, direction)
}

fn build_facets(params: &QueryParams) -> Vec<FacetSpec> {
    let Some(fields) = params.get("facets") else {
        return Vec::new();
    };
    fields
        .split(',')
        .map(|field| {
            let option = |key: &str| params.get_non_empty(&format!("{field}.{key}"));
            FacetSpec {
                field: field.to_string(),
                limit: option("limit").and_then(|raw| raw.trim().parse().ok()),
                offset: option("offset").and_then(|raw| raw.trim().parse().ok()),
                sort: option("sort").and_then(|raw| raw.parse::<FacetSort>().ok()),
                filter: option("filter").map(str::to_string),
            }
        })
        .collect()
}

fn build_indexable(params: &QueryParams) -> Option<Indexable> {
    let raw = params.get_non_empty("index")?;
    let mut parts = raw.split(',');
    Some(Indexable {
        field: parts.next().unwrap_or_default().to_string(),
        operation_key: parts.next().and_then(|key| key.parse::<OperationKey>().ok()),
        option: parts.next().map(str::to_string),
    })
}

/// Inverse of [`translate`]: the query parameters a navigation to `request` carries.
pub fn encode(request: &Request) -> QueryParams {
    let mut params = encode_pageable(&request.pageable);

    if !request.facets.is_empty() {
        let fields: Vec<&str> = request.facets.iter().map(|f| f.field.as_str()).collect();
        params.set("facets", fields.join(","));
        for facet in &request.facets {
            let values = [
                facet.limit.map(|v| v.to_string()),
                facet.offset.map(|v| v.to_string()),
                facet.sort.map(|v| v.as_str().to_string()),
                facet.filter.clone(),
            ];
            for (key, value) in FACET_OPTIONS.iter().zip(values) {
                if let Some(value) = value {
                    params.set(format!("{}.{key}", facet.field), value);
                }
            }
        }
    }

    if let Some(index) = &request.indexable {
        let mut raw = index.field.clone();
        match (index.operation_key, index.option.as_deref()) {
            (Some(key), Some(option)) => raw.push_str(&format!(",{},{option}", key.as_str())),
            (Some(key), None) => raw.push_str(&format!(",{}", key.as_str())),
            (None, Some(option)) => raw.push_str(&format!(",,{option}")),
            (None, None) => {}
        }
        params.set("index", raw);
    }

    if let Some(query) = &request.query {
        params.set("query", query.clone());
    }

    params
}

pub fn encode_pageable(pageable: &Pageable) -> QueryParams {
    let mut params = QueryParams::new();
    if let Some(number) = pageable.number {
        params.set("page", number.to_string());
    }
    if let Some(size) = pageable.size {
        params.set("size", size.to_string());
    }
    for sort in &pageable.sort {
        params.append("sort", format!("{},{}", sort.field, sort.direction.as_str()));
    }
    params
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
