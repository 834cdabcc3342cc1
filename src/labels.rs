//! Static Chinese label tables and the bilingual UI strings.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::normalize::CATEGORY_SEPARATOR;

static TAX_CATEGORY_ZH: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Total Taxes", "总税收"),
        ("Property taxes", "财产税"),
        ("General sales and gross receipts", "一般销售和总收入税"),
        ("Motor fuels", "汽油税"),
        ("Alcoholic beverages", "酒精饮料税"),
        ("Public utilities", "公用事业税"),
        ("Insurance premiums", "保险费税"),
        ("Tobacco products", "烟草产品税"),
        ("Sports betting (including pari-mutuels)", "体育博彩（包括相对博彩）"),
        ("Amusements", "娱乐税"),
        ("Other selective sales and gross receipts", "其他选择性销售和总收入税"),
        ("Motor vehicles", "汽车税"),
        ("Motor vehicle operators", "汽车操作员税"),
        ("Corporations in general", "一般公司税"),
        ("Hunting and fishing", "狩猎和钓鱼税"),
        ("Occupation and businesses", "职业和商业税"),
        ("Other license taxes", "其他许可证税"),
        ("Individual income", "个人所得税"),
        ("Corporation net income", "公司净收入税"),
        ("Death and gift", "遗产和赠与税"),
        ("Severance", "离职税"),
        ("Documentary and stock transfer", "文件和股票转让税"),
        ("Other taxes, NEC", "其他未分类税收"),
    ])
});

static STATE_ZH: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("U.S. Total (excludes Washington, D.C.)", "美国总计（不包括华盛顿特区）"),
        ("Alabama", "亚拉巴马州"),
        ("Alaska", "阿拉斯加州"),
        ("Arizona", "亚利桑那州"),
        ("Arkansas", "阿肯色州"),
        ("California", "加利福尼亚州"),
        ("Colorado", "科罗拉多州"),
        ("Connecticut", "康涅狄格州"),
        ("Delaware", "特拉华州"),
        ("Florida", "佛罗里达州"),
        ("Georgia", "乔治亚州"),
        ("Hawaii", "夏威夷州"),
        ("Idaho", "爱达荷州"),
        ("Illinois", "伊利诺伊州"),
        ("Indiana", "印第安纳州"),
        ("Iowa", "艾奥瓦州"),
        ("Kansas", "堪萨斯州"),
        ("Kentucky", "肯塔基州"),
        ("Louisiana", "路易斯安那州"),
        ("Maine", "缅因州"),
        ("Maryland", "马里兰州"),
        ("Massachusetts", "马萨诸塞州"),
        ("Michigan", "密歇根州"),
        ("Minnesota", "明尼苏达州"),
        ("Mississippi", "密西西比州"),
        ("Missouri", "密苏里州"),
        ("Montana", "蒙大拿州"),
        ("Nebraska", "内布拉斯加州"),
        ("Nevada", "内华达州"),
        ("New Hampshire", "新罕布什尔州"),
        ("New Jersey", "新泽西州"),
        ("New Mexico", "新墨西哥州"),
        ("New York", "纽约州"),
        ("North Carolina", "北卡罗来纳州"),
        ("North Dakota", "北达科他州"),
        ("Ohio", "俄亥俄州"),
        ("Oklahoma", "俄克拉荷马州"),
        ("Oregon", "俄勒冈州"),
        ("Pennsylvania", "宾夕法尼亚州"),
        ("Rhode Island", "罗得岛州"),
        ("South Carolina", "南卡罗来纳州"),
        ("South Dakota", "南达科他州"),
        ("Tennessee", "田纳西州"),
        ("Texas", "德克萨斯州"),
        ("Utah", "犹他州"),
        ("Vermont", "佛蒙特州"),
        ("Virginia", "弗吉尼亚州"),
        ("Washington", "华盛顿州"),
        ("West Virginia", "西弗吉尼亚州"),
        ("Wisconsin", "威斯康星州"),
        ("Wyoming", "怀俄明州"),
        ("Washington, D.C.", "华盛顿特区"),
    ])
});

/// Chinese name of a state, if known.
pub fn state_zh(state: &str) -> Option<&'static str> {
    STATE_ZH.get(state).copied()
}

/// Chinese name of a tax category. Composite keys fall back to the child label.
pub fn tax_category_zh(category: &str) -> Option<&'static str> {
    TAX_CATEGORY_ZH.get(category).copied().or_else(|| {
        category
            .split_once(CATEGORY_SEPARATOR)
            .and_then(|(_, child)| TAX_CATEGORY_ZH.get(child).copied())
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
}

impl Locale {
    pub fn from_param(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "zh" | "zh-cn" | "cn" => Some(Locale::Zh),
            "en" | "en-us" => Some(Locale::En),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Zh => "zh",
            Locale::En => "en",
        }
    }

    /// Display name for a state. Unknown names show the source label.
    pub fn state(&self, state: &str) -> String {
        match self {
            Locale::En => state.to_string(),
            Locale::Zh => state_zh(state).map(str::to_string).unwrap_or_else(|| {
                debug!(%state, "no translation for state");
                state.to_string()
            }),
        }
    }

    /// Display name for a tax category. Unknown names show the source label.
    pub fn tax_category(&self, category: &str) -> String {
        match self {
            Locale::En => category.replace(CATEGORY_SEPARATOR, " / "),
            Locale::Zh => tax_category_zh(category)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    debug!(%category, "no translation for tax category");
                    category.to_string()
                }),
        }
    }

    pub fn text(&self) -> &'static UiText {
        match self {
            Locale::Zh => &ZH_TEXT,
            Locale::En => &EN_TEXT,
        }
    }
}

/// Page strings for one locale.
#[derive(Debug)]
pub struct UiText {
    pub title: &'static str,
    pub tab_by_category: &'static str,
    pub tab_by_state: &'static str,
    pub pick_quarter: &'static str,
    pub pick_categories: &'static str,
    pub pick_states: &'static str,
    pub submit: &'static str,
    pub state_axis: &'static str,
    pub category_axis: &'static str,
    pub revenue_axis: &'static str,
    pub chart_by_category: &'static str,
    pub chart_by_state: &'static str,
    pub nothing_selected: &'static str,
    pub load_failed: &'static str,
}

static ZH_TEXT: UiText = UiText {
    title: "美国各州财政收入",
    tab_by_category: "税收-按州分类",
    tab_by_state: "税收-按税种分类",
    pick_quarter: "请选择财政季度/范围",
    pick_categories: "请选择一个或多个税种",
    pick_states: "请选择州",
    submit: "更新",
    state_axis: "州名",
    category_axis: "税种",
    revenue_axis: "财政收入 (十亿美元)",
    chart_by_category: "各州税收收入：",
    chart_by_state: "各税种税收收入",
    nothing_selected: "尚未选择",
    load_failed: "数据加载失败",
};

static EN_TEXT: UiText = UiText {
    title: "U.S. State Tax Revenue",
    tab_by_category: "Revenue by state",
    tab_by_state: "Revenue by tax type",
    pick_quarter: "Fiscal quarter / range",
    pick_categories: "Tax categories",
    pick_states: "States",
    submit: "Update",
    state_axis: "State",
    category_axis: "Tax category",
    revenue_axis: "Revenue (billions of dollars)",
    chart_by_category: "State tax revenue: ",
    chart_by_state: "Tax revenue by category: ",
    nothing_selected: "Nothing selected",
    load_failed: "Failed to load data",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_table_complete() {
        // 50 states, DC and the national total
        assert_eq!(STATE_ZH.len(), 52);
        assert_eq!(state_zh("Ohio"), Some("俄亥俄州"));
        assert_eq!(state_zh("Atlantis"), None);
    }

    #[test]
    fn test_composite_falls_back_to_child() {
        assert_eq!(tax_category_zh("Motor fuels"), Some("汽油税"));
        assert_eq!(
            tax_category_zh("Selective sales taxes|Motor fuels"),
            Some("汽油税")
        );
        assert_eq!(tax_category_zh("Unheard of levy"), None);
    }

    #[test]
    fn test_locale_labels() {
        assert_eq!(Locale::Zh.state("Texas"), "德克萨斯州");
        assert_eq!(Locale::Zh.state("Atlantis"), "Atlantis");
        assert_eq!(Locale::En.state("Texas"), "Texas");
        assert_eq!(
            Locale::En.tax_category("License taxes|Motor vehicles"),
            "License taxes / Motor vehicles"
        );
        assert_eq!(Locale::from_param("EN"), Some(Locale::En));
        assert_eq!(Locale::from_param("fr"), None);
        assert_eq!(Locale::default(), Locale::Zh);
    }
}
