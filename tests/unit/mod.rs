mod week_window;
