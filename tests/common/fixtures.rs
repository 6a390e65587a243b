use std::path::Path;

use ui_prober::device::gestures::GestureTimings;
use ui_prober::device::wait::StabilityConfig;
use ui_prober::explorer::explorer_model::{ExplorerConfig, ScreenTarget};

/// A single clickable button as the whole hierarchy.
pub const SINGLE_BUTTON_XML: &str =
    r#"<node class="ButtonClass" index="0" clickable="true" bounds="[0,0][100,50]"/>"#;

pub const BUTTON_DETAIL_XML: &str =
    r#"<node class="DetailClass" index="0" text="opened" bounds="[0,0][100,50]"/>"#;

/// Appium-style dump: a list, a tappable row, a horizontal pager and a large image.
pub const FEED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hierarchy rotation="0">
  <android.widget.FrameLayout index="0" class="android.widget.FrameLayout" bounds="[0,0][1080,1920]">
    <androidx.recyclerview.widget.RecyclerView index="0" class="androidx.recyclerview.widget.RecyclerView" resource-id="com.example:id/feed" scrollable="true" bounds="[0,200][1080,1600]">
      <android.widget.LinearLayout index="0" class="android.widget.LinearLayout" clickable="true" bounds="[0,200][1080,500]">
        <android.widget.TextView index="0" class="android.widget.TextView" text="Row one" bounds="[40,220][600,280]"/>
        <android.widget.ImageButton index="1" class="android.widget.ImageButton" clickable="true" long-clickable="true" content-desc="More" bounds="[960,220][1040,300]"/>
      </android.widget.LinearLayout>
      <android.widget.LinearLayout index="1" class="android.widget.LinearLayout" clickable="true" bounds="[0,500][1080,800]"/>
    </androidx.recyclerview.widget.RecyclerView>
    <androidx.viewpager.widget.ViewPager index="1" class="androidx.viewpager.widget.ViewPager" resource-id="com.example:id/pager" scrollable="true" bounds="[0,1600][1080,1800]"/>
    <android.widget.ImageView index="2" class="android.widget.ImageView" resource-id="com.example:id/photo" bounds="[0,0][1080,600]"/>
  </android.widget.FrameLayout>
</hierarchy>"#;

pub fn fast_stability() -> StabilityConfig {
    StabilityConfig {
        poll_interval_ms: 0,
        stable_polls: 2,
        timeout_ms: 2_000,
    }
}

pub fn fast_config(package: &str, root: &Path) -> ExplorerConfig {
    let mut config = ExplorerConfig::new(package);
    config.dataset_dir = root.join("dataset");
    config.progress_dir = root.join("test_progress");
    config.stability = fast_stability();
    config.timings = GestureTimings::immediate();
    config
}

pub fn screen(name: &str) -> ScreenTarget {
    ScreenTarget {
        name: name.to_string(),
        navigate: vec![],
    }
}
