use crate::frontier::SourceDescriptor;
use serde::Deserialize;

/// Main configuration structure for Reel-Crawl
///
/// Every section falls back to the values observed on the origin site, so a
/// configuration file only needs to mention what it changes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub tag_query: TagQueryConfig,
    /// Explicit source list used by the `custom` mode
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
}

/// Origin site layout
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SiteConfig {
    /// Scheme and host every relative path is resolved against
    pub base_url: String,

    /// Path of the JSON tag-search endpoint
    pub search_path: String,

    /// Substring that marks an anchor target as an item page
    pub item_pattern: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://movie.douban.com".to_string(),
            search_path: "/j/search_subjects".to_string(),
            item_pattern: "/subject/".to_string(),
        }
    }
}

/// Fixed request identity sent with every fetch
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,

    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,\
                     image/avif,image/webp,image/apng,*/*;q=0.8"
                .to_string(),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8".to_string(),
            timeout_ms: 20_000,
        }
    }
}

/// Politeness delays (all in milliseconds)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PacingConfig {
    /// Random delay range applied before every item fetch
    pub min_fetch_delay_ms: u64,
    pub max_fetch_delay_ms: u64,

    /// Random delay range applied before every enumeration page request
    pub min_page_delay_ms: u64,
    pub max_page_delay_ms: u64,

    /// Cooldown applied after the items of each enumeration page
    pub page_cooldown_ms: u64,

    /// Successful fetches between two batch cooldowns
    pub batch_size: u32,

    /// Cooldown applied after each batch
    pub batch_cooldown_ms: u64,

    /// Cooldown applied between two sources
    pub source_cooldown_ms: u64,

    /// Sources crawled between two group cooldowns; 0 disables them
    pub source_group_size: u32,

    /// Extra cooldown applied after each group of sources
    pub source_group_cooldown_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_fetch_delay_ms: 2_000,
            max_fetch_delay_ms: 4_000,
            min_page_delay_ms: 1_000,
            max_page_delay_ms: 3_000,
            page_cooldown_ms: 10_000,
            batch_size: 5,
            batch_cooldown_ms: 5_000,
            source_cooldown_ms: 10_000,
            source_group_size: 5,
            source_group_cooldown_ms: 30_000,
        }
    }
}

/// Output file locations
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Path to the visited-URL ledger (JSON array of ids)
    pub ledger_path: String,

    /// Path to the extracted records (JSON array of objects)
    pub results_path: String,

    /// Path to the markdown summary file
    pub summary_path: String,

    /// Persist ledger and results every N committed items (0 disables)
    pub checkpoint_every: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            ledger_path: "crawled_urls.json".to_string(),
            results_path: "movies.json".to_string(),
            summary_path: "summary.md".to_string(),
            checkpoint_every: 25,
        }
    }
}

/// The paginated listing source
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ListingConfig {
    pub base_path: String,
    pub page_size: u32,

    /// Hard ceiling on the listing offset
    pub max_offset: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            base_path: "/top250".to_string(),
            page_size: 25,
            max_offset: 250,
        }
    }
}

/// Tag-driven search sources
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TagQueryConfig {
    pub page_size: u32,

    /// Pages requested per tag before giving up on it
    pub max_pages: u32,

    /// Tags walked by the `all-tags` mode, in order
    pub tags: Vec<String>,
}

impl Default for TagQueryConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            max_pages: 30,
            tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Popular tags exposed by the origin's tag search
pub const DEFAULT_TAGS: &[&str] = &[
    "热门", "最新", "经典", "可播放", "豆瓣高分", "冷门佳片", "华语", "欧美", "韩国", "日本",
    "动作", "喜剧", "爱情", "科幻", "悬疑", "恐怖", "动画", "纪录片", "短片", "情色", "音乐",
    "歌舞", "家庭", "儿童", "传记", "历史", "战争", "西部", "奇幻", "冒险", "灾难", "武侠",
    "古装", "运动", "黑色电影", "犯罪", "剧情", "惊悚", "同性", "女性", "青春",
];
