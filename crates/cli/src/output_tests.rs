// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn table_aligns_columns_to_widest_cell() {
    let rows = vec![
        vec!["a".to_string(), "1".to_string()],
        vec!["longer".to_string(), "{\"n\":2}".to_string()],
    ];

    let rendered = render_table("counts", &["Key", "Value"], &rows);

    assert_eq!(
        rendered,
        "counts\n\
         Key     Value\n\
         ------  -------\n\
         a       1\n\
         longer  {\"n\":2}\n"
    );
}

#[test]
fn empty_table_still_has_header() {
    let rendered = render_table("empty", &["Key", "Value"], &[]);
    assert_eq!(rendered, "empty\nKey  Value\n---  -----\n");
}
