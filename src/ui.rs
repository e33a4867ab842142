use crate::models::SessionResponse;

pub fn render_index(session: &SessionResponse) -> String {
    let username = session.username.as_deref().unwrap_or("");
    INDEX_HTML
        .replace("{{AUTHENTICATED}}", if session.authenticated { "true" } else { "false" })
        .replace("{{USERNAME}}", &escape_html(username))
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>GitHub Trending Dashboard</title>
  <style>
    body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 1100px; padding: 24px; }
    nav button.active { font-weight: 600; }
    .cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 16px; }
    .card { border: 1px solid #ddd; border-radius: 10px; padding: 14px; }
    .badge { border-radius: 6px; padding: 2px 6px; font-size: 0.8rem; color: white; }
    .badge.success { background: #2e7d32; }
    .badge.danger { background: #c62828; }
    .badge.secondary { background: #757575; }
    .dot { display: inline-block; width: 10px; height: 10px; border-radius: 50%; margin-right: 4px; }
    #notice[data-level="error"] { color: #c62828; }
    #notice[data-level="warning"] { color: #ef6c00; }
    #notice[data-level="success"] { color: #2e7d32; }
    .admin-only { display: none; }
    body[data-auth="true"] .admin-only { display: initial; }
    body[data-auth="true"] .guest-only { display: none; }
    table { border-collapse: collapse; width: 100%; }
    td, th { border-bottom: 1px solid #eee; padding: 6px; text-align: left; }
  </style>
</head>
<body data-auth="{{AUTHENTICATED}}">
  <header>
    <h1>GitHub Trending</h1>
    <nav>
      <button data-view="latest" class="active">Latest</button>
      <button data-view="dashboard">Dashboard</button>
      <button data-view="history" class="admin-only">History</button>
      <button id="crawl-btn" class="admin-only">Crawl</button>
      <span class="admin-only">Signed in as <strong id="username">{{USERNAME}}</strong></span>
      <button id="logout-btn" class="admin-only">Log out</button>
    </nav>
    <form id="login-form" class="guest-only">
      <input id="login-user" placeholder="username" autocomplete="username" />
      <input id="login-pass" type="password" placeholder="password" autocomplete="current-password" />
      <button type="submit">Admin login</button>
    </form>
    <p id="notice" aria-live="polite"></p>
    <div id="progress" hidden>
      <progress id="progress-bar" max="100" value="0"></progress>
      <span id="progress-message"></span>
    </div>
  </header>

  <main>
    <section id="latest-section">
      <form id="weekly-form">
        <input id="weekly-year" type="number" placeholder="year" />
        <input id="weekly-week" type="number" min="1" max="53" placeholder="week" />
        <button type="submit">Show week</button>
      </form>
      <p id="report-info"></p>
      <div id="repo-list" class="cards"></div>
    </section>
    <section id="dashboard-section" hidden>
      <div id="summary" class="cards"></div>
      <h2>Most frequently listed</h2>
      <table>
        <thead><tr><th>#</th><th>Project</th><th>Weeks listed</th><th>Last seen</th></tr></thead>
        <tbody id="ranking-body"></tbody>
      </table>
    </section>
    <section id="history-section" hidden>
      <input id="history-search" placeholder="Search history..." />
      <button id="batch-delete-btn">Delete selected</button>
      <table>
        <thead><tr><th><input type="checkbox" id="select-all" /></th><th>#</th><th>Title</th><th>Generated</th><th>Projects</th><th></th></tr></thead>
        <tbody id="history-body"></tbody>
      </table>
    </section>
  </main>

  <script>
    const noticeEl = document.getElementById('notice');
    const repoList = document.getElementById('repo-list');
    const reportInfo = document.getElementById('report-info');
    const historyBody = document.getElementById('history-body');
    const progressEl = document.getElementById('progress');
    const progressBar = document.getElementById('progress-bar');
    const progressMessage = document.getElementById('progress-message');

    const notify = (message, level) => {
      noticeEl.textContent = message;
      noticeEl.dataset.level = level || '';
    };

    const escapeHtml = (value) => String(value ?? '').replace(/[&<>"']/g, (c) => ({
      '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'
    })[c]);

    const request = async (url, options = {}) => {
      const response = await fetch(url, {
        headers: { 'Content-Type': 'application/json' },
        ...options,
      });
      if (!response.ok) {
        const message = await response.text();
        if (response.status === 401) {
          refreshSession();
        }
        throw new Error(message || `HTTP ${response.status}`);
      }
      return response.json();
    };

    const setAuth = (authenticated, username) => {
      document.body.dataset.auth = authenticated ? 'true' : 'false';
      document.getElementById('username').textContent = username || '';
    };

    // a rejected call does not end the session; ask the server what it still holds
    const refreshSession = async () => {
      try {
        const response = await fetch('/api/session');
        const session = await response.json();
        setAuth(session.authenticated, session.username);
      } catch (error) {
        console.warn('session unavailable', error);
      }
    };

    const renderCard = (card) => `
      <article class="card">
        <h3>${card.rank}. <a href="${escapeHtml(card.html_url || '#')}" target="_blank">${escapeHtml(card.name)}</a>
          ${card.badge ? `<span class="badge ${card.badge.tone}">${card.badge.label}</span>` : ''}</h3>
        <p>${escapeHtml(card.description)}</p>
        <p>&#9733; ${card.stars.toLocaleString()} &middot; forks ${card.forks.toLocaleString()}
          ${card.language ? `&middot; <span class="dot" style="background:${card.language_color}"></span>${escapeHtml(card.language)}` : ''}</p>
      </article>`;

    const showReport = (view) => {
      const meta = view.metadata || {};
      reportInfo.textContent = [meta.report_title, meta.generation_date].filter(Boolean).join(' - ');
      repoList.innerHTML = view.repositories.map(renderCard).join('');
    };

    const loadLatest = async () => {
      try {
        showReport(await request('/api/latest'));
      } catch (error) {
        repoList.innerHTML = '';
        notify(error.message, 'error');
      }
    };

    const loadStatistics = async () => {
      try {
        const stats = await request('/api/statistics');
        const s = stats.summary;
        document.getElementById('summary').innerHTML = [
          ['Weeks', s.total_weeks],
          ['Projects', s.total_unique_projects],
          ['Technologies', s.total_unique_technologies],
          ['Languages', s.total_unique_languages],
        ].map(([label, value]) => `<div class="card"><strong>${value}</strong><br>${label}</div>`).join('');
        document.getElementById('ranking-body').innerHTML = stats.rankings.map((row) => `
          <tr>
            <td>${row.position}</td>
            <td title="${escapeHtml(row.full_name)}">${escapeHtml(row.name)}</td>
            <td>${row.count}</td>
            <td>${escapeHtml(row.last_seen)}</td>
          </tr>`).join('');
      } catch (error) {
        notify(error.message, 'error');
      }
    };

    const loadHistory = async (term) => {
      try {
        const query = term ? `?q=${encodeURIComponent(term)}` : '';
        const rows = await request(`/api/history${query}`);
        historyBody.innerHTML = rows.map((row) => `
          <tr>
            <td><input type="checkbox" class="history-checkbox" value="${row.id}" /></td>
            <td>${row.index}</td>
            <td>${escapeHtml(row.title)}</td>
            <td>${escapeHtml(row.generated)}</td>
            <td>${row.total_repositories}</td>
            <td><button data-view-report="${row.id}">View</button> <button data-delete="${row.id}">Delete</button></td>
          </tr>`).join('');
      } catch (error) {
        notify(error.message, 'warning');
      }
    };

    const pollProgress = async () => {
      try {
        const view = await request('/api/crawl/progress');
        progressBar.value = view.percent;
        progressMessage.textContent = view.message;
        progressEl.hidden = !view.active;
      } catch (error) {
        console.warn('progress unavailable', error);
      }
    };

    document.querySelectorAll('nav [data-view]').forEach((button) => {
      button.addEventListener('click', () => {
        const view = button.dataset.view;
        document.querySelectorAll('nav [data-view]').forEach((b) => b.classList.toggle('active', b === button));
        ['latest', 'dashboard', 'history'].forEach((name) => {
          document.getElementById(`${name}-section`).hidden = name !== view;
        });
        if (view === 'latest') loadLatest();
        if (view === 'dashboard') loadStatistics();
        if (view === 'history') loadHistory();
      });
    });

    document.getElementById('login-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      try {
        const session = await request('/api/login', {
          method: 'POST',
          body: JSON.stringify({
            username: document.getElementById('login-user').value,
            password: document.getElementById('login-pass').value,
          }),
        });
        setAuth(session.authenticated, session.username);
        notify('Logged in', 'success');
      } catch (error) {
        notify(error.message, 'error');
      }
    });

    document.getElementById('logout-btn').addEventListener('click', async () => {
      const session = await request('/api/logout', { method: 'POST' });
      setAuth(session.authenticated, session.username);
      notify('Logged out', 'success');
    });

    document.getElementById('crawl-btn').addEventListener('click', async () => {
      if (!confirm('Start a crawl? This can take several minutes.')) return;
      progressEl.hidden = false;
      const timer = setInterval(pollProgress, 1000);
      try {
        const notice = await request('/api/crawl', { method: 'POST' });
        notify(notice.message, notice.level);
        loadLatest();
      } catch (error) {
        notify(error.message, 'error');
      } finally {
        clearInterval(timer);
        progressEl.hidden = true;
      }
    });

    document.getElementById('history-search').addEventListener('input', (event) => {
      loadHistory(event.target.value.trim());
    });

    document.getElementById('select-all').addEventListener('change', (event) => {
      document.querySelectorAll('.history-checkbox').forEach((box) => { box.checked = event.target.checked; });
    });

    const showSection = (view) => {
      document.querySelectorAll('nav [data-view]').forEach((b) => b.classList.toggle('active', b.dataset.view === view));
      ['latest', 'dashboard', 'history'].forEach((name) => {
        document.getElementById(`${name}-section`).hidden = name !== view;
      });
    };

    document.getElementById('weekly-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const year = document.getElementById('weekly-year').value;
      const week = document.getElementById('weekly-week').value;
      if (!year || !week) return;
      try {
        showReport(await request(`/api/weekly/${year}/${week}`));
      } catch (error) {
        notify(error.message, 'error');
      }
    });

    historyBody.addEventListener('click', async (event) => {
      const reportId = event.target.dataset.viewReport;
      if (reportId) {
        try {
          showReport(await request(`/api/reports/${reportId}`));
          showSection('latest');
        } catch (error) {
          notify(error.message, 'error');
        }
        return;
      }
      const id = event.target.dataset.delete;
      if (!id || !confirm('Delete this report?')) return;
      try {
        const notice = await request(`/api/reports/${id}`, { method: 'DELETE' });
        notify(notice.message, notice.level);
      } catch (error) {
        notify(error.message, 'error');
      }
      loadHistory();
    });

    document.getElementById('batch-delete-btn').addEventListener('click', async () => {
      const ids = Array.from(document.querySelectorAll('.history-checkbox:checked')).map((box) => Number(box.value));
      if (!ids.length) {
        notify('Select the records to delete', 'warning');
        return;
      }
      if (!confirm(`Delete ${ids.length} selected records?`)) return;
      try {
        const report = await request('/api/reports/batch-delete', { method: 'POST', body: JSON.stringify({ ids }) });
        notify(report.notice.message, report.notice.level);
      } catch (error) {
        notify(error.message, 'error');
      }
      loadHistory();
    });

    loadLatest();
  </script>
</body>
</html>
"#;
