//! Recipe document → typed entities and relations.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use cookrag_core::types::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Dish,
    Ingredient,
    Category,
    Cuisine,
    Difficulty,
    Tool,
}

impl EntityType {
    /// Graph-store node label.
    pub fn label(&self) -> &'static str {
        match self {
            EntityType::Dish => "Dish",
            EntityType::Ingredient => "Ingredient",
            EntityType::Category => "Category",
            EntityType::Cuisine => "Cuisine",
            EntityType::Difficulty => "Difficulty",
            EntityType::Tool => "Tool",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            EntityType::Dish => "dish",
            EntityType::Ingredient => "ing",
            EntityType::Category => "cat",
            EntityType::Cuisine => "cuisine",
            EntityType::Difficulty => "diff",
            EntityType::Tool => "tool",
        }
    }

    pub fn entity_id(&self, name: &str) -> String {
        format!("{}_{}", self.id_prefix(), name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    Contains,
    BelongsTo,
    Cuisine,
    Difficulty,
    UsesTool,
    Substitute,
    Subclass,
}

impl RelationType {
    /// Edge type as materialized in the graph store.
    pub fn label(&self) -> &'static str {
        match self {
            RelationType::Contains => "包含",
            RelationType::BelongsTo => "属于",
            RelationType::Cuisine => "菜系",
            RelationType::Difficulty => "难度",
            RelationType::UsesTool => "使用",
            RelationType::Substitute => "替代",
            RelationType::Subclass => "子类",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub entity_type: EntityType,
    pub properties: Metadata,
}

#[derive(Debug, Clone)]
pub struct Relation {
    pub from: String,
    pub to: String,
    pub relation_type: RelationType,
    pub properties: Metadata,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractedData {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}

// Seed dictionary of common ingredients: vegetables, meats, bean
// products, eggs/dairy, seasonings, staples.
const KNOWN_INGREDIENTS: &[&str] = &[
    "西红柿", "番茄", "黄瓜", "茄子", "土豆", "萝卜", "白菜", "菠菜", "芹菜", "韭菜",
    "辣椒", "青椒", "红椒", "胡萝卜", "洋葱", "蒜", "姜", "葱",
    "猪肉", "五花肉", "牛肉", "羊肉", "鸡肉", "鸭肉", "鱼", "虾", "蟹", "海参",
    "豆腐", "豆皮", "腐竹",
    "鸡蛋", "鸭蛋", "皮蛋", "牛奶",
    "盐", "糖", "醋", "酱油", "生抽", "老抽", "料酒", "豆瓣酱", "花椒", "八角",
    "米饭", "面条", "面粉",
];

const TOOLS: &[&str] = &[
    "锅", "砂锅", "炒锅", "平底锅", "高压锅", "汤锅", "刀", "砧板", "碗", "盘子", "筷子",
];

const CUISINE_MARKERS: &[(&str, &str)] = &[
    ("川", "川菜"),
    ("湘", "湘菜"),
    ("粤", "粤菜"),
    ("鲁", "鲁菜"),
    ("苏", "苏菜"),
    ("浙", "浙菜"),
    ("闽", "闽菜"),
    ("徽", "徽菜"),
];

static DIFFICULTY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"难度[：:]*([★☆]+|[一二三四]+)").unwrap());
static QUANTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\s*(g|ml|克|毫升|个|根|片)").unwrap());

// Ingredient names stop at the first quantity or unit character.
const TRUNCATION_CHARS: &str = " 0123456789gml克毫升";

pub struct RecipeExtractor {
    ingredient_dict: HashSet<&'static str>,
}

impl Default for RecipeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeExtractor {
    pub fn new() -> Self {
        Self { ingredient_dict: KNOWN_INGREDIENTS.iter().copied().collect() }
    }

    /// Extract the full entity/relation set of one recipe document.
    pub fn extract(&self, content: &str, category: &str, dish_name: &str) -> ExtractedData {
        let mut data = ExtractedData::default();

        let dish_id = EntityType::Dish.entity_id(dish_name);
        let mut dish_props = Metadata::new();
        dish_props.insert("content".into(), content.into());
        dish_props.insert("category".into(), category.into());
        data.entities.push(Entity {
            id: dish_id.clone(),
            name: dish_name.to_string(),
            entity_type: EntityType::Dish,
            properties: dish_props,
        });

        for ingredient in self.extract_ingredients(content) {
            let ing_id = EntityType::Ingredient.entity_id(&ingredient);
            data.entities.push(Entity {
                id: ing_id.clone(),
                name: ingredient,
                entity_type: EntityType::Ingredient,
                properties: Metadata::new(),
            });
            data.relations.push(Relation {
                from: dish_id.clone(),
                to: ing_id,
                relation_type: RelationType::Contains,
                properties: Metadata::new(),
            });
        }

        if !category.is_empty() {
            let cat_id = EntityType::Category.entity_id(category);
            data.entities.push(Entity {
                id: cat_id.clone(),
                name: category.to_string(),
                entity_type: EntityType::Category,
                properties: Metadata::new(),
            });
            data.relations.push(Relation {
                from: dish_id.clone(),
                to: cat_id,
                relation_type: RelationType::BelongsTo,
                properties: Metadata::new(),
            });
        }

        if let Some(difficulty) = extract_difficulty(content) {
            let diff_id = EntityType::Difficulty.entity_id(&difficulty);
            data.entities.push(Entity {
                id: diff_id.clone(),
                name: difficulty,
                entity_type: EntityType::Difficulty,
                properties: Metadata::new(),
            });
            data.relations.push(Relation {
                from: dish_id.clone(),
                to: diff_id,
                relation_type: RelationType::Difficulty,
                properties: Metadata::new(),
            });
        }

        let cuisine = infer_cuisine(category, content);
        let cuisine_id = EntityType::Cuisine.entity_id(cuisine);
        data.entities.push(Entity {
            id: cuisine_id.clone(),
            name: cuisine.to_string(),
            entity_type: EntityType::Cuisine,
            properties: Metadata::new(),
        });
        data.relations.push(Relation {
            from: dish_id.clone(),
            to: cuisine_id,
            relation_type: RelationType::Cuisine,
            properties: Metadata::new(),
        });

        for tool in extract_tools(content) {
            let tool_id = EntityType::Tool.entity_id(tool);
            data.entities.push(Entity {
                id: tool_id.clone(),
                name: tool.to_string(),
                entity_type: EntityType::Tool,
                properties: Metadata::new(),
            });
            data.relations.push(Relation {
                from: dish_id.clone(),
                to: tool_id,
                relation_type: RelationType::UsesTool,
                properties: Metadata::new(),
            });
        }

        data
    }

    /// Scan the ingredient section of the document. Entered on a line
    /// containing 必备原料/原料, exited at the next `##` heading that is
    /// not itself about ingredients.
    fn extract_ingredients(&self, content: &str) -> Vec<String> {
        let mut ingredients = Vec::new();
        let mut in_section = false;

        for line in content.lines() {
            let line = line.trim();

            if line.contains("必备原料") || line.contains("原料") {
                in_section = true;
                continue;
            }
            if line.starts_with("##") && !line.contains("原料") && in_section {
                break;
            }
            if !in_section {
                continue;
            }

            let line = line
                .trim_start_matches('*')
                .trim_start_matches('-')
                .trim();

            if !self.is_ingredient(line) {
                continue;
            }

            let name = truncate_at_quantity(line);
            let len = name.chars().count();
            if (2..=4).contains(&len) {
                ingredients.push(name);
            }
        }

        unique_preserving_order(ingredients)
    }

    fn is_ingredient(&self, text: &str) -> bool {
        let text = text.trim();
        if text.chars().count() < 2 {
            return false;
        }

        // quantity lines still count when they open with a known name
        if QUANTITY_RE.is_match(text)
            && self.ingredient_dict.iter().any(|ing| text.starts_with(ing))
        {
            return true;
        }

        if self.ingredient_dict.contains(text) {
            return true;
        }

        // short, majority-CJK lines are ingredient candidates
        let total = text.chars().count();
        let cjk = text
            .chars()
            .filter(|c| ('\u{4e00}'..='\u{9fa5}').contains(c))
            .count();
        cjk as f64 / total as f64 >= 0.5 && total <= 4
    }
}

fn truncate_at_quantity(line: &str) -> String {
    let cut = line
        .char_indices()
        .enumerate()
        .find(|(char_pos, (_, c))| *char_pos > 0 && TRUNCATION_CHARS.contains(*c))
        .map(|(_, (byte_pos, _))| byte_pos);
    match cut {
        Some(pos) => line[..pos].trim().to_string(),
        None => line.trim().to_string(),
    }
}

fn extract_difficulty(content: &str) -> Option<String> {
    DIFFICULTY_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn infer_cuisine(category: &str, content: &str) -> &'static str {
    for (marker, cuisine) in CUISINE_MARKERS {
        if category.contains(marker) || content.contains(cuisine) {
            return cuisine;
        }
    }
    "家常菜"
}

fn extract_tools(content: &str) -> Vec<&'static str> {
    TOOLS.iter().copied().filter(|tool| content.contains(tool)).collect()
}

fn unique_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPE: &str = "# 红烧肉\n\n难度：★★★\n\n## 必备原料\n\n* 五花肉 500g\n* 酱油 15ml\n* 糖\n\n## 计算\n\n用炒锅翻炒，起锅前收汁装入盘子。";

    #[test]
    fn dish_ingredients_and_relations_are_extracted() {
        let extractor = RecipeExtractor::new();
        let data = extractor.extract(RECIPE, "meat_dish", "红烧肉");

        let dish = &data.entities[0];
        assert_eq!(dish.id, "dish_红烧肉");
        assert_eq!(dish.entity_type, EntityType::Dish);
        assert_eq!(dish.properties["category"], "meat_dish");

        let ingredients: Vec<&str> = data
            .entities
            .iter()
            .filter(|e| e.entity_type == EntityType::Ingredient)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(ingredients, vec!["五花肉", "酱油"]);

        let contains = data
            .relations
            .iter()
            .filter(|r| r.relation_type == RelationType::Contains)
            .count();
        assert_eq!(contains, 2);
    }

    #[test]
    fn difficulty_and_cuisine_and_tools() {
        let extractor = RecipeExtractor::new();
        let data = extractor.extract(RECIPE, "meat_dish", "红烧肉");

        assert!(data
            .entities
            .iter()
            .any(|e| e.entity_type == EntityType::Difficulty && e.name == "★★★"));
        assert!(data
            .entities
            .iter()
            .any(|e| e.entity_type == EntityType::Cuisine && e.name == "家常菜"));

        let tools: Vec<&str> = data
            .entities
            .iter()
            .filter(|e| e.entity_type == EntityType::Tool)
            .map(|e| e.name.as_str())
            .collect();
        assert!(tools.contains(&"锅"));
        assert!(tools.contains(&"炒锅"));
        assert!(tools.contains(&"盘子"));
    }

    #[test]
    fn sichuan_marker_in_category_wins_over_fallback() {
        let extractor = RecipeExtractor::new();
        let data = extractor.extract("## 原料\n\n* 豆腐", "川菜", "麻婆豆腐");
        assert!(data
            .entities
            .iter()
            .any(|e| e.entity_type == EntityType::Cuisine && e.name == "川菜"));
    }

    #[test]
    fn no_difficulty_entity_without_a_match() {
        let extractor = RecipeExtractor::new();
        let data = extractor.extract("## 原料\n\n* 豆腐", "", "麻婆豆腐");
        assert!(!data.entities.iter().any(|e| e.entity_type == EntityType::Difficulty));
        // empty category emits no Category entity either
        assert!(!data.entities.iter().any(|e| e.entity_type == EntityType::Category));
    }

    #[test]
    fn ingredient_section_boundaries_are_respected() {
        let extractor = RecipeExtractor::new();
        let content = "## 必备原料\n\n* 鸡蛋 2个\n* 西红柿\n\n## 操作\n\n* 土豆";
        let data = extractor.extract(content, "", "西红柿炒蛋");
        let ingredients: Vec<&str> = data
            .entities
            .iter()
            .filter(|e| e.entity_type == EntityType::Ingredient)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(ingredients, vec!["鸡蛋", "西红柿"]);
    }

    #[test]
    fn duplicate_ingredients_keep_first_seen_order() {
        let extractor = RecipeExtractor::new();
        let content = "## 原料\n\n* 酱油\n* 豆腐\n* 酱油";
        let data = extractor.extract(content, "", "测试菜");
        let ingredients: Vec<&str> = data
            .entities
            .iter()
            .filter(|e| e.entity_type == EntityType::Ingredient)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(ingredients, vec!["酱油", "豆腐"]);
    }
}
