use std::collections::HashMap;
use std::path::Path;

use image::{Rgb, RgbImage};
use ui_prober::device::transport::{DeviceTransport, PointerStep, PointerTrack};
use ui_prober::error::ProbeError;
use ui_prober::gesture::gesture_model::ScreenSize;
use ui_prober::hierarchy::bounds::{Bounds, Point};

pub const LAUNCHER: &str = "com.android.launcher";
pub const LAUNCHER_XML: &str = r#"<node class="Launcher" index="0" bounds="[0,0][1080,1920]"/>"#;

/// A tap inside `bounds` on page `from` switches to page `to`.
#[derive(Debug, Clone)]
pub struct Transition {
    pub from: String,
    pub bounds: Bounds,
    pub to: String,
}

/// Scripted in-memory device. Pages are named hierarchy documents; the
/// target app always launches on `launch_page`.
#[derive(Debug)]
pub struct FakeDevice {
    pub package: String,
    pub foreground: String,
    pub pages: HashMap<String, String>,
    pub current: String,
    pub launch_page: String,
    pub transitions: Vec<Transition>,
    pub screen: ScreenSize,

    pub calls: Vec<String>,
    pub performed: Vec<Vec<PointerTrack>>,
    pub shell_log: Vec<String>,

    pub fail_perform: bool,
    pub fail_page_source: bool,
    pub fail_force_stop: bool,
    pub home_key_works: bool,
}

impl FakeDevice {
    /// Device showing `package` on `launch_page`.
    pub fn new(package: &str, launch_page: &str, xml: &str) -> Self {
        let mut pages = HashMap::new();
        pages.insert(launch_page.to_string(), xml.to_string());

        FakeDevice {
            package: package.to_string(),
            foreground: package.to_string(),
            pages,
            current: launch_page.to_string(),
            launch_page: launch_page.to_string(),
            transitions: vec![],
            screen: ScreenSize {
                width: 1080,
                height: 1920,
            },
            calls: vec![],
            performed: vec![],
            shell_log: vec![],
            fail_perform: false,
            fail_page_source: false,
            fail_force_stop: false,
            home_key_works: true,
        }
    }

    pub fn with_page(mut self, name: &str, xml: &str) -> Self {
        self.pages.insert(name.to_string(), xml.to_string());
        self
    }

    pub fn with_transition(mut self, from: &str, bounds: &str, to: &str) -> Self {
        self.transitions.push(Transition {
            from: from.to_string(),
            bounds: Bounds::parse(bounds).unwrap(),
            to: to.to_string(),
        });
        self
    }

    fn current_xml(&self) -> String {
        if self.foreground != self.package {
            return LAUNCHER_XML.to_string();
        }
        self.pages.get(&self.current).cloned().unwrap_or_default()
    }

    fn page_color(&self) -> [u8; 3] {
        if self.foreground != self.package {
            return [0, 0, 0];
        }
        let sum: u32 = self.current.bytes().map(u32::from).sum();
        [(sum % 251) as u8, (sum * 7 % 253) as u8, (sum * 13 % 255) as u8]
    }

    fn press_at(&mut self, point: Point) {
        if self.foreground != self.package {
            return;
        }
        let hit = self
            .transitions
            .iter()
            .find(|t| t.from == self.current && t.bounds.contains(point))
            .map(|t| t.to.clone());
        if let Some(to) = hit {
            self.current = to;
        }
    }
}

impl DeviceTransport for FakeDevice {
    fn save_screenshot(&mut self, path: &Path) -> Result<(), ProbeError> {
        self.calls.push("screenshot".into());
        let img = RgbImage::from_pixel(8, 8, Rgb(self.page_color()));
        img.save(path).map_err(|e| ProbeError::Image {
            context: path.display().to_string(),
            source: e,
        })
    }

    fn page_source(&mut self) -> Result<String, ProbeError> {
        if self.fail_page_source {
            return Err(ProbeError::transport("page source", "device offline"));
        }
        Ok(self.current_xml())
    }

    fn current_package(&mut self) -> Result<String, ProbeError> {
        Ok(self.foreground.clone())
    }

    fn activate_app(&mut self, package: &str) -> Result<(), ProbeError> {
        self.calls.push(format!("activate {}", package));
        if package == self.package {
            self.foreground = package.to_string();
            self.current = self.launch_page.clone();
        }
        Ok(())
    }

    fn terminate_app(&mut self, package: &str) -> Result<(), ProbeError> {
        self.calls.push(format!("terminate {}", package));
        if self.foreground == package {
            self.foreground = LAUNCHER.to_string();
        }
        Ok(())
    }

    fn window_size(&mut self) -> Result<ScreenSize, ProbeError> {
        Ok(self.screen)
    }

    fn perform(&mut self, tracks: &[PointerTrack]) -> Result<(), ProbeError> {
        if self.fail_perform {
            return Err(ProbeError::transport("perform actions", "injected failure"));
        }
        self.performed.push(tracks.to_vec());

        for track in tracks {
            let mut position = None;
            for step in &track.steps {
                match step {
                    PointerStep::Move { x, y, .. } => position = Some(Point::new(*x, *y)),
                    PointerStep::Down => {
                        if let Some(p) = position {
                            self.press_at(p);
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn shell(&mut self, command: &str) -> Result<String, ProbeError> {
        self.shell_log.push(command.to_string());

        if command.starts_with("am force-stop") {
            if self.fail_force_stop {
                return Err(ProbeError::transport("mobile: shell", "force-stop refused"));
            }
            if let Some(pkg) = command.split_whitespace().nth(2) {
                if self.foreground == pkg {
                    self.foreground = LAUNCHER.to_string();
                }
            }
        } else if command == "input keyevent KEYCODE_HOME" && self.home_key_works {
            self.foreground = LAUNCHER.to_string();
        }

        Ok(String::new())
    }
}
