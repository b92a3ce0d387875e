//! 审计详情构造
//!
//! 为变更操作生成结构化 details：
//! - [`create_snapshot`] — 实体完整 JSON 快照（创建 / 删除）
//! - [`create_diff`] — 顶层字段 diff（更新，只记录变化的字段）

use serde::Serialize;
use serde_json::{Map, Value, json};

/// 实体完整快照。序列化失败时退化为空对象，不影响主操作。
pub fn create_snapshot<T: Serialize>(entity: &T, resource: &str) -> Value {
    let snapshot = serde_json::to_value(entity).unwrap_or_else(|_| json!({}));
    json!({
        "resource": resource,
        "snapshot": snapshot,
    })
}

/// 顶层字段 diff：`{"field": {"from": old, "to": new}}`。
///
/// 只比较对象的顶层键；嵌套结构整体比较。非对象输入退化为
/// before/after 全量记录。
pub fn create_diff<T: Serialize>(old: &T, new: &T, resource: &str) -> Value {
    let old_value = serde_json::to_value(old).unwrap_or_else(|_| json!({}));
    let new_value = serde_json::to_value(new).unwrap_or_else(|_| json!({}));

    let (Value::Object(old_map), Value::Object(new_map)) = (&old_value, &new_value) else {
        return json!({
            "resource": resource,
            "before": old_value,
            "after": new_value,
        });
    };

    let mut changes = Map::new();
    for (key, new_field) in new_map {
        let old_field = old_map.get(key).unwrap_or(&Value::Null);
        if old_field != new_field {
            changes.insert(
                key.clone(),
                json!({ "from": old_field, "to": new_field }),
            );
        }
    }

    json!({
        "resource": resource,
        "changes": Value::Object(changes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Thing {
        name: String,
        count: i64,
    }

    #[test]
    fn diff_records_only_changed_fields() {
        let old = Thing {
            name: "a".into(),
            count: 1,
        };
        let new = Thing {
            name: "a".into(),
            count: 2,
        };

        let diff = create_diff(&old, &new, "thing");
        let changes = &diff["changes"];
        assert!(changes.get("name").is_none());
        assert_eq!(changes["count"]["from"], 1);
        assert_eq!(changes["count"]["to"], 2);
    }

    #[test]
    fn snapshot_embeds_the_entity() {
        let entity = Thing {
            name: "a".into(),
            count: 1,
        };
        let snap = create_snapshot(&entity, "thing");
        assert_eq!(snap["resource"], "thing");
        assert_eq!(snap["snapshot"]["name"], "a");
    }
}
