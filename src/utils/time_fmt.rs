/// 把秒数格式化为 mm:ss，分钟数超过 99 时照常显示
pub fn format_mm_ss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mm_ss() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(59), "00:59");
        assert_eq!(format_mm_ss(60), "01:00");
        assert_eq!(format_mm_ss(30 * 60 + 5), "30:05");
        assert_eq!(format_mm_ss(120 * 60), "120:00");
    }
}
